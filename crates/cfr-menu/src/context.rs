use crate::config::MenuConfig;
use crate::policy::PolicyLock;
use crate::store::VariableStore;

/// Everything one menu build needs, passed explicitly.
#[derive(Clone, Copy)]
pub struct MenuContext<'c> {
    pub store: &'c dyn VariableStore,
    pub policy: Option<&'c dyn PolicyLock>,
    pub config: &'c MenuConfig,
}

impl<'c> MenuContext<'c> {
    #[must_use]
    pub const fn new(store: &'c dyn VariableStore, config: &'c MenuConfig) -> Self {
        Self {
            store,
            policy: None,
            config,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: &'c dyn PolicyLock) -> Self {
        self.policy = Some(policy);
        self
    }
}

impl std::fmt::Debug for MenuContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuContext")
            .field("policy", &self.policy.is_some())
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}
