#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const UPLOAD_COMMAND: CommandSpec = CommandSpec {
    command: "upload",
    action: "upload",
};

pub(crate) const SELECT_COMMAND: CommandSpec = CommandSpec {
    command: "select",
    action: "select",
};

/// Commands whose whole remainder is one free-text argument.
pub(crate) const TEXT_ARG_COMMANDS: &[(CommandSpec, &str)] = &[
    (
        CommandSpec {
            command: "refine",
            action: "refine",
        },
        "instructions",
    ),
    (
        CommandSpec {
            command: "style",
            action: "new_style",
        },
        "style",
    ),
];

pub(crate) const OPTIONAL_PATH_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "export",
    action: "export",
}];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "undo",
        action: "undo",
    },
    CommandSpec {
        command: "back",
        action: "back",
    },
    CommandSpec {
        command: "reset",
        action: "reset",
    },
    CommandSpec {
        command: "show",
        action: "show",
    },
    CommandSpec {
        command: "dismiss",
        action: "dismiss",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/upload <path> [instructions]",
    "/select <n>",
    "/refine <instructions>",
    "/style <name>",
    "/undo",
    "/back",
    "/reset",
    "/show",
    "/export [dir]",
    "/dismiss",
    "/help",
    "/quit",
];
