pub fn add(a: i32, b: i32) -> i32 {
    a + b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_add_numbers_correctly() {
        assert_eq!(add(2, 3), 5);
    }
}
