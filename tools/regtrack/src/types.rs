/// What the host runner hands to a hook: either a real test or a synthetic
/// placeholder standing in for a setup-time error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestSubject {
    Test(String),
    Placeholder { reason: String },
}

impl TestSubject {
    pub fn test(id: impl Into<String>) -> Self {
        Self::Test(id.into())
    }

    pub fn placeholder(reason: impl Into<String>) -> Self {
        Self::Placeholder {
            reason: reason.into(),
        }
    }

    pub fn test_id(&self) -> Option<&str> {
        match self {
            Self::Test(id) => Some(id),
            Self::Placeholder { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Fixed,
    Regression,
    None,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Regression => "regression",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Yes,
    No,
    DontCare,
}

impl Selection {
    /// Whether the host's default inclusion policy would still run the test.
    pub fn allows(self) -> bool {
        !matches!(self, Self::No)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    All,
    RegressionOnly,
    NewOnly,
}

impl SelectionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::RegressionOnly => "regression_only",
            Self::NewOnly => "new_only",
        }
    }
}
