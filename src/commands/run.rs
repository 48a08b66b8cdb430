use crate::autotype::CommandTyper;
use crate::cli::Cli;
use crate::clipboard::CommandClipboard;
use crate::config::ConfigLoader;
use crate::daemon::protocol::Request;
use crate::daemon::{DaemonClient, DaemonServer, PortRegistry, RequestHandler, Session, Termination};
use crate::error::Result;
use crate::menu::Pipeline;
use crate::ui::CommandPicker;
use crate::vault::KeepassVault;
use colored::*;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

/// kpmenu 한 번 실행
///
/// 실행 중인 데몬이 있으면 인자를 넘기고 끝내고, 없으면 이 프로세스가 데몬이 됩니다.
pub async fn run(cli: &Cli, args: Vec<String>) -> Result<ExitCode> {
    let registry = PortRegistry::default_location()?;

    match DaemonClient::new(registry.clone()).send(&Request::new(args)).await {
        Ok(response) => {
            print!("{}", response.output);
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => debug!("no live daemon: {}", e),
    }

    if cli.quit {
        eprintln!("{} No daemon is running.", "[i]".cyan());
        return Ok(ExitCode::SUCCESS);
    }

    let loader = ConfigLoader::new();
    let mut config = loader.load_cli(cli)?;
    config.validate()?;
    if config.flags.daemon {
        info!("executing as daemon");
    }

    let session = Session::new(config, Box::new(KeepassVault::new()));
    let pipeline = Pipeline::new(
        Arc::new(CommandPicker::new()),
        Arc::new(CommandClipboard::new()),
        Arc::new(CommandTyper::new()),
    );
    let mut server = DaemonServer::new(session, pipeline, RequestHandler::new(loader), registry);

    let termination = server.run().await;

    info!("waiting for clipboard clean-up");
    server.pipeline().clipboard().wait().await;

    let termination = termination?;
    debug!("daemon terminated: {:?}", termination);
    Ok(if is_failure(termination) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// 캐시 없이 한 번 실행한 결과가 치명적일 때만 실패로 끝냅니다.
fn is_failure(termination: Termination) -> bool {
    match termination {
        Termination::Direct { fatal } => fatal,
        Termination::CacheExpired | Termination::Fatal => false,
    }
}
