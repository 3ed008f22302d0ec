//! Relay CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use relay::agent_loop::{DispatchLoop, DispatchRequest, LoopPolicy, RunEvent, RunEventStream};
use relay::cli::console::{is_quit, Console, ConsoleClarifier};
use relay::cli::render::{render_workflow_event, Terminal};
use relay::cli::{ChatArgs, Cli, Commands, WorkflowArgs};
use relay::config::RelayConfig;
use relay::error::RelayError;
use relay::payments::{payment_registry, payment_workflow, PaymentAgents, PaymentLedger};
use relay::provider::{ConversationProvider, ResponsesProvider};
use relay::workflow::{RunOptions, WorkflowEvent};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Chat(ref args) => handle_chat(&cli, args).await,
        Commands::Workflow(ref args) => handle_workflow(&cli, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Everything both commands share: config, provider and the tool-backed dispatch loop.
struct Session {
    config: RelayConfig,
    provider: Arc<dyn ConversationProvider>,
    terminal: Arc<Terminal>,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self, RelayError> {
        let config = RelayConfig::load_from(cli.config.as_deref())?;
        let provider = Arc::new(ResponsesProvider::from_config(&config)?);
        Ok(Self {
            config,
            provider,
            terminal: Arc::new(Terminal::new()),
        })
    }

    /// Dispatch loop with the payment tools; `show` filters which run events are printed.
    fn dispatch(&self, show: fn(&RunEvent) -> bool) -> Result<DispatchLoop, RelayError> {
        let registry = payment_registry(Arc::new(PaymentLedger::seeded()))?;
        let terminal = Arc::clone(&self.terminal);
        Ok(DispatchLoop::new(Arc::clone(&self.provider), Arc::new(registry))
            .with_policy(LoopPolicy::from_config(&self.config))
            .with_event_sink(Arc::new(move |event: RunEvent| {
                if show(&event) {
                    terminal.run_event(&event);
                }
            })))
    }
}

/// Cancel `token` on Ctrl-C. Abort the returned task once the run is over.
fn cancel_on_ctrl_c(token: &CancellationToken) -> tokio::task::JoinHandle<()> {
    let token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    })
}

async fn handle_chat(cli: &Cli, args: &ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(cli)?;
    let dispatch = session.dispatch(|_| true)?;
    let console = Console::stdin();

    let conversation_id = session.provider.create_conversation().await?;
    println!("Created conversation (id: {conversation_id})");
    println!("\nStarting interactive session. Type 'quit' to exit.\n");

    loop {
        let Some(input) = console.read_line("INPUT: ").await? else {
            break;
        };
        if is_quit(&input) {
            println!("Exiting interactive session.");
            break;
        }
        if input.is_empty() {
            continue;
        }

        let request = DispatchRequest::builder()
            .conversation_id(conversation_id.as_str())
            .agent(args.agent.as_str())
            .input(input)
            .build();
        let cancel = CancellationToken::new();
        let watcher = cancel_on_ctrl_c(&cancel);
        let result = dispatch.run(request, &cancel).await;
        watcher.abort();

        match result {
            Ok(_) => {}
            Err(RelayError::Cancelled) => session.terminal.line("(cancelled)"),
            Err(err) => {
                session
                    .terminal
                    .line(format!("Error: {err} [{}]", err.recovery_suggestion()));
                if matches!(err, RelayError::Authentication(_) | RelayError::Configuration(_)) {
                    return Err(err.into());
                }
            }
        }
        println!();
    }
    Ok(())
}

async fn handle_workflow(cli: &Cli, args: &WorkflowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(cli)?;
    let dispatch = session.dispatch(|event| event.stream == RunEventStream::Tool)?;
    let workflow = payment_workflow(PaymentAgents::new(dispatch), &session.config)?;

    let conversation_id = session.provider.create_conversation().await?;
    let cancel = CancellationToken::new();
    let watcher = cancel_on_ctrl_c(&cancel);

    println!("\nStarting payment workflow...\n");
    let options = RunOptions::builder()
        .conversation_id(conversation_id)
        .cancel(cancel.clone())
        .clarifier(Arc::new(ConsoleClarifier::new(Console::stdin())))
        .build();

    let mut events = workflow.run_stream(args.request.as_str(), options);
    let mut failure = None;
    while let Some(event) = events.next().await {
        if let Some(line) = render_workflow_event(&event) {
            session.terminal.line(line);
        }
        if let WorkflowEvent::Failed {
            error,
            cancelled: false,
        } = event
        {
            failure = Some(error);
        }
    }
    watcher.abort();

    match failure {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
