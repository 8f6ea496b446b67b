//! Help Handler
//!
//! Fallback for messages no rule recognised. Makes no gateway calls.

use async_trait::async_trait;

use super::{Handler, Reply, Turn};
use crate::intent::Intent;

const HELP_TEXT: &str = "I can help you with cryptocurrency information. \
You can ask about prices, trending coins, charts, or manage your portfolio.";

pub struct HelpHandler;

#[async_trait]
impl Handler for HelpHandler {
    fn intent(&self) -> Intent {
        Intent::Help
    }

    async fn handle(&self, _turn: &Turn<'_>) -> Reply {
        Reply::text(HELP_TEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_help_text() {
        let turn = Turn {
            text: "hello",
            holdings: &[],
        };
        let reply = HelpHandler.handle(&turn).await;
        assert_eq!(reply.message.content(), Some(HELP_TEXT));
        assert!(reply.updated_holdings.is_none());
    }
}
