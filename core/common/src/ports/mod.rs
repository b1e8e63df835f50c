//! Ports & Adapters のポート定義
//!
//! - inbound: なし（各レポーターの main が usecase を直接呼ぶ）
//! - outbound: usecase が外界と言語固有部分に依頼するための trait

pub mod outbound;
