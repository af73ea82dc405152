use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{
    ChatController, ConversationController, ExportController, ResolveController,
    StatusController,
};

pub struct Router<'a> {
    status_controller: StatusController<'a>,
    resolve_controller: ResolveController<'a>,
    conversation_controller: ConversationController<'a>,
    chat_controller: ChatController<'a>,
    export_controller: ExportController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            status_controller: StatusController::new(container),
            resolve_controller: ResolveController::new(container),
            conversation_controller: ConversationController::new(container),
            chat_controller: ChatController::new(container),
            export_controller: ExportController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Status { json } => self.status_controller.status(json).await,
            Commands::Resolve { role, tier } => self.resolve_controller.resolve(role, tier).await,
            Commands::New { role, tier, title } => {
                self.conversation_controller.create(role, tier, title).await
            }
            Commands::List {
                limit,
                offset,
                query,
            } => self.conversation_controller.list(limit, offset, query).await,
            Commands::Show { id } => self.conversation_controller.show(id).await,
            Commands::Rename { id, title } => self.conversation_controller.rename(id, title).await,
            Commands::Chat { id, content } => self.chat_controller.chat(id, content).await,
            Commands::Export { id } => self.export_controller.export(id).await,
            Commands::Serve => unreachable!("serve is handled separately in main"),
        }
    }
}
