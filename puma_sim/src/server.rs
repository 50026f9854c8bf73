use std::sync::Arc;

use puma_kinematics::ArmController;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::SimConfig;
use crate::error::SimError;
use crate::protocol::{error_line, respond_to_line};

/// Longest request line accepted, terminator excluded.
pub const MAX_LINE_LENGTH: usize = 4096;

pub type SharedArm = Arc<Mutex<ArmController<f64>>>;

/// Bind the configured address and serve until the listener fails.
pub async fn run(config: SimConfig) -> Result<(), SimError> {
    config.validate()?;
    let listener = TcpListener::bind(config.connection_url()).await?;
    info!("Arm simulator listening on {}", listener.local_addr()?);
    serve(listener, Arc::new(Mutex::new(config.controller()))).await
}

/// Accept connections forever. All clients drive the same arm.
pub async fn serve(listener: TcpListener, arm: SharedArm) -> Result<(), SimError> {
    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };
        debug!("Client connected from {}", addr);

        let arm = Arc::clone(&arm);
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, arm).await {
                error!("Error handling client {}: {}", addr, e);
            }
        });
    }
}

/// Read newline-terminated requests and answer each one in order.
///
/// A line longer than [`MAX_LINE_LENGTH`] gets one `ProtocolError` and the
/// rest of it, up to the next newline, is dropped.
pub async fn handle_client(mut socket: TcpStream, arm: SharedArm) -> Result<(), SimError> {
    let mut buffer = vec![0; 1024];
    let mut temp_buffer = Vec::new();
    let mut discarding = false;

    loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            break;
        }

        temp_buffer.extend_from_slice(&buffer[..n]);

        while let Some(pos) = temp_buffer.iter().position(|&x| x == b'\n') {
            let request: Vec<u8> = temp_buffer.drain(..=pos).collect();
            if discarding {
                discarding = false;
                continue;
            }
            if pos > MAX_LINE_LENGTH {
                socket.write_all(oversized_line(pos)?.as_bytes()).await?;
                continue;
            }

            let request = String::from_utf8_lossy(&request[..request.len() - 1]);
            let request = request.trim();
            if request.is_empty() {
                continue;
            }

            let response = {
                let mut arm = arm.lock().await;
                respond_to_line(&mut arm, request)?
            };
            socket.write_all(response.as_bytes()).await?;
        }

        if temp_buffer.len() > MAX_LINE_LENGTH {
            if !discarding {
                socket.write_all(oversized_line(temp_buffer.len())?.as_bytes()).await?;
                discarding = true;
            }
            temp_buffer.clear();
        }
    }

    Ok(())
}

fn oversized_line(length: usize) -> Result<String, SimError> {
    warn!("Dropping request line of at least {} bytes", length);
    Ok(error_line(format!(
        "request line exceeds {} bytes",
        MAX_LINE_LENGTH
    ))?)
}
