//! 세션 데몬
//!
//! 첫 실행은 데몬이 되어 복호화된 데이터베이스를 메모리에 유지하고, 이후 실행은
//! 클라이언트로서 자신의 인자를 데몬에 넘깁니다. 포트 파일은 bind할 때마다 덮어쓰므로
//! 클라이언트는 항상 가장 최근에 게시된 데몬을 따라갑니다.

pub mod client;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

pub use client::DaemonClient;
pub use handler::RequestHandler;
pub use registry::PortRegistry;
pub use server::{DaemonServer, Termination};
pub use session::Session;
