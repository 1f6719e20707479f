use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use message_trail_core::history::list_message_history;
use message_trail_core::messaging::{create_message, delete_user_cascade, update_message_content};
use message_trail_core::notify::{list_notifications, mark_notification_read};
use message_trail_core::query::{create_user, store_stats};
use message_trail_core::seed::seed_demo;
use message_trail_core::{
    flatten_forest, get_thread, get_thread_between, open_store, CoreError, MessageStore, StoreConfig,
};

#[derive(Debug, Parser)]
#[command(name = "message_trail", about = "Threaded messages with edit history and notifications")]
struct Cli {
    /// Overrides MESSAGE_TRAIL_DB_PATH.
    #[arg(long)]
    db: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a demo Alice/Bob conversation.
    Seed {
        #[arg(long, default_value_t = 3)]
        depth: usize,
    },
    AddUser {
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    Send {
        sender: String,
        receiver: String,
        content: String,
        #[arg(long)]
        parent: Option<i64>,
    },
    Edit {
        message_id: i64,
        content: String,
        #[arg(long)]
        editor: Option<String>,
    },
    History {
        message_id: i64,
    },
    Thread {
        message_id: i64,
    },
    Between {
        user_a: String,
        user_b: String,
    },
    Notifications {
        user_id: String,
        #[arg(long)]
        unread: bool,
    },
    Read {
        notification_id: i64,
    },
    DeleteUser {
        user_id: String,
    },
    Stats,
}

fn run(store: &MessageStore, command: Command) -> anyhow::Result<serde_json::Value> {
    let conn = &store.conn;
    match command {
        Command::Seed { depth } => {
            let seed = seed_demo(conn, depth)?;
            Ok(serde_json::json!({
                "alice": seed.alice,
                "bob": seed.bob,
                "root_ids": seed.root_ids,
            }))
        }
        Command::AddUser {
            email,
            first_name,
            last_name,
        } => to_json(create_user(conn, &email, &first_name, &last_name)?),
        Command::Send {
            sender,
            receiver,
            content,
            parent,
        } => to_json(create_message(conn, &sender, &receiver, &content, parent)?),
        Command::Edit {
            message_id,
            content,
            editor,
        } => to_json(update_message_content(conn, message_id, &content, editor.as_deref())?),
        Command::History { message_id } => to_json(list_message_history(conn, message_id)?),
        // Trees go out as flat pre-order rows; nested output would recurse per reply level.
        Command::Thread { message_id } => match get_thread(conn, message_id)? {
            Some(root) => to_json(flatten_forest(std::slice::from_ref(&root))),
            None => Err(CoreError::NotFound(format!("message {}", message_id)).into()),
        },
        Command::Between { user_a, user_b } => {
            to_json(flatten_forest(&get_thread_between(conn, &user_a, &user_b)?))
        }
        Command::Notifications { user_id, unread } => {
            to_json(list_notifications(conn, &user_id, unread)?)
        }
        Command::Read { notification_id } => to_json(mark_notification_read(conn, notification_id)?),
        Command::DeleteUser { user_id } => to_json(delete_user_cascade(conn, &user_id)?),
        Command::Stats => to_json(store_stats(conn)?),
    }
}

fn to_json<T: Serialize>(value: T) -> anyhow::Result<serde_json::Value> {
    serde_json::to_value(value).context("serializing command output")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "message_trail=info,message_trail_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = StoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let store =
        open_store(&config).with_context(|| format!("opening {}", config.db_path.display()))?;
    let label = format!("{:?}", cli.command);
    match run(&store, cli.command) {
        Ok(output) => {
            info!(command = %label, "command completed");
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            error!(command = %label, error = %err, "command failed");
            Err(err)
        }
    }
}
