// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use helpdesk_client::{ChatWidget, DisplayMessage, FileSessionStorage, HttpChatApi, Sender};
use tokio::io::{AsyncBufReadExt, BufReader};

mod cli;
mod logging;

type Widget = ChatWidget<HttpChatApi, FileSessionStorage>;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    if let Commands::Version = args.command {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let storage = match &args.session_file {
        Some(path) => FileSessionStorage::new(path),
        None => FileSessionStorage::default_location()?,
    };
    let mut widget = ChatWidget::new(HttpChatApi::new(&args.server), storage);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match args.command {
            Commands::Chat => chat(&mut widget).await,
            Commands::Send { message } => {
                widget.restore().await;
                match widget.send(&message).await {
                    [_, reply] => {
                        println!("{}", reply.text);
                        Ok(())
                    }
                    [failure] => Err(Error::Custom(failure.text.clone())),
                    _ => Err(Error::Custom("Nothing to send".to_string())),
                }
            }
            Commands::History => {
                widget.restore().await;
                if widget.messages().is_empty() {
                    println!("No conversation yet.");
                }
                for msg in widget.messages() {
                    print_message(msg);
                }
                Ok(())
            }
            Commands::Clear => {
                widget.clear();
                println!("Session cleared.");
                Ok(())
            }
            Commands::Version => Ok(()),
        }
    })
}

async fn chat(widget: &mut Widget) -> Result<()> {
    widget.restore().await;
    if widget.messages().is_empty() {
        println!("Hello! I'm your AI support assistant. How can I help you today?");
        println!("Try asking about shipping, returns, or our products!");
    }
    for msg in widget.messages() {
        print_message(msg);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/clear" => {
                widget.clear();
                println!("Session cleared.");
            }
            "" => {}
            text => {
                for msg in widget.send(text).await {
                    if msg.sender == Sender::Ai {
                        print_message(msg);
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_message(msg: &DisplayMessage) {
    let who = match msg.sender {
        Sender::User => "you",
        Sender::Ai => "support",
    };
    println!("[{}] {who}: {}", msg.timestamp.format("%H:%M"), msg.text);
}
