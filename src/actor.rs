use crate::permissions::PlayerPermissionsCache;
use mcadmin_commands::CommandSource;
use std::sync::{Arc, Mutex};

/// Lines of output produced for an actor while running commands.
#[derive(Debug, Clone, Default)]
pub struct Outbox(Arc<Mutex<Vec<String>>>);

impl Outbox {
    pub fn push(&self, line: impl Into<String>) {
        if let Ok(mut lines) = self.0.lock() {
            lines.push(line.into());
        }
    }

    pub fn drain(&self) -> Vec<String> {
        match self.0.lock() {
            Ok(mut lines) => lines.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ActorKind {
    Console,
    Player {
        permissions: Arc<PlayerPermissionsCache>,
    },
}

/// Who a command line is run for.
#[derive(Debug, Clone)]
pub struct Actor {
    name: String,
    kind: ActorKind,
    outbox: Outbox,
}

impl Actor {
    pub fn console(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ActorKind::Console,
            outbox: Outbox::default(),
        }
    }

    pub fn player(name: impl Into<String>, permissions: PlayerPermissionsCache) -> Self {
        Self {
            name: name.into(),
            kind: ActorKind::Player {
                permissions: Arc::new(permissions),
            },
            outbox: Outbox::default(),
        }
    }

    /// The same actor, replying into `outbox`.
    pub fn with_outbox(mut self, outbox: Outbox) -> Self {
        self.outbox = outbox;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ActorKind {
        &self.kind
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn reply(&self, message: impl Into<String>) {
        self.outbox.push(message);
    }
}

impl CommandSource for Actor {
    fn has_permission(&self, permission: &str) -> bool {
        match &self.kind {
            ActorKind::Console => true,
            ActorKind::Player { permissions } => permissions.has(permission),
        }
    }

    fn is_console(&self) -> bool {
        matches!(self.kind, ActorKind::Console)
    }
}
