// state.rs - Shared Bot State
// Everything the command handlers share, built once in main.rs and stored in
// the serenity TypeMap so text and slash adapters can hand it to handlers.

use std::sync::Arc;

use serenity::{client::Context, prelude::TypeMapKey};
use tokio::sync::RwLock;

use crate::config_store::ConfigStore;
use crate::like_api::LikeApi;

pub struct BotState {
    pub store: RwLock<ConfigStore>,
    pub api: Arc<dyn LikeApi>,
    pub prefix: String,
}

impl BotState {
    pub fn new(store: ConfigStore, api: Arc<dyn LikeApi>, prefix: String) -> Self {
        BotState {
            store: RwLock::new(store),
            api,
            prefix,
        }
    }
}

pub struct BotStateKey;
impl TypeMapKey for BotStateKey {
    type Value = Arc<BotState>;
}

/// Fetch the shared state from the client's TypeMap
pub async fn bot_state(ctx: &Context) -> Option<Arc<BotState>> {
    let data = ctx.data.read().await;
    data.get::<BotStateKey>().cloned()
}
