/// How a nested object's message is named.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum NamingPolicy {
    /// The key itself: field name and message name are the same string.
    /// Same key at two places ⇒ the later message replaces the earlier one.
    #[default]
    Key,
    /// `<Parent>_<key>`, unique per path.
    Qualified,
}

impl NamingPolicy {
    pub fn child_name(self, parent: &str, key: &str) -> String {
        match self {
            NamingPolicy::Key => key.to_string(),
            NamingPolicy::Qualified => format!("{parent}_{key}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_names() {
        assert_eq!(NamingPolicy::Key.child_name("RootBuf", "a"), "a");
        assert_eq!(NamingPolicy::Qualified.child_name("RootBuf", "a"), "RootBuf_a");
        assert_eq!(NamingPolicy::Qualified.child_name("RootBuf_a", "b"), "RootBuf_a_b");
    }
}
