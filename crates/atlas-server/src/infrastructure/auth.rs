use std::collections::HashMap;

use atlas_core::config::AuthConfig;
use atlas_core::core_types::UserId;

use crate::application::ports::auth::CallerResolver;
use crate::domain::permission::Caller;

/// 基于配置中静态 API 令牌的调用者解析
pub struct TokenCallerResolver {
    callers: HashMap<String, Caller>,
}

impl TokenCallerResolver {
    pub fn from_config(config: &AuthConfig) -> Self {
        let callers = config
            .tokens
            .iter()
            .map(|entry| {
                let name = if entry.name.is_empty() {
                    entry.user_id.clone()
                } else {
                    entry.name.clone()
                };
                (
                    entry.token.clone(),
                    Caller {
                        user_id: UserId::from(entry.user_id.as_str()),
                        name,
                        role: entry.role,
                        is_active: entry.is_active,
                    },
                )
            })
            .collect();
        Self { callers }
    }

    pub fn len(&self) -> usize {
        self.callers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }
}

impl CallerResolver for TokenCallerResolver {
    fn resolve(&self, bearer_token: Option<&str>) -> Option<Caller> {
        let token = bearer_token.map(str::trim).filter(|t| !t.is_empty())?;
        self.callers.get(token).cloned()
    }
}
