pub trait StrExt {
    fn truncate_with_ellipsis(&self, max_len: usize) -> String;
}

impl StrExt for str {
    fn truncate_with_ellipsis(&self, max_len: usize) -> String {
        if self.chars().count() <= max_len {
            self.to_string()
        } else {
            let kept: String = self.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}
