//! Alarm device transports

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

use crate::error::TransportError;

/// Alarm device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    /// Serial port of the alarm device (e.g. "/dev/ttyUSB0" or "COM13").
    /// `None` runs without a device.
    pub port: Option<String>,
    /// Baud rate
    pub baud_rate: u32,
    /// Wait after opening the port; the microcontroller resets on connect (ms)
    pub settle_ms: u64,
    /// Per-command write timeout (ms)
    pub write_timeout_ms: u64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 115_200,
            settle_ms: 2000,
            write_timeout_ms: 1000,
        }
    }
}

/// Something that can deliver a one-byte command to the alarm device
#[allow(async_fn_in_trait)]
pub trait AlarmTransport {
    /// Write one command byte
    async fn send_byte(&mut self, value: u8) -> Result<(), TransportError>;

    /// Release the device
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Alarm device on a serial port
pub struct SerialTransport {
    port: String,
    stream: SerialStream,
    write_timeout: Duration,
}

impl SerialTransport {
    /// Open the configured port and wait for the device to settle
    pub async fn connect(config: &AlarmConfig) -> Result<Self, TransportError> {
        let port = config.port.clone().ok_or(TransportError::Unavailable)?;
        let write_timeout = Duration::from_millis(config.write_timeout_ms);

        let stream = tokio_serial::new(&port, config.baud_rate)
            .timeout(write_timeout)
            .open_native_async()
            .map_err(|e| TransportError::Open {
                port: port.clone(),
                reason: e.to_string(),
            })?;

        if config.settle_ms > 0 {
            debug!("Waiting {}ms for alarm device to reset", config.settle_ms);
            tokio::time::sleep(Duration::from_millis(config.settle_ms)).await;
        }

        info!("Connected to alarm device on {} @ {} baud", port, config.baud_rate);

        Ok(Self {
            port,
            stream,
            write_timeout,
        })
    }
}

impl AlarmTransport for SerialTransport {
    async fn send_byte(&mut self, value: u8) -> Result<(), TransportError> {
        let limit = self.write_timeout;
        let stream = &mut self.stream;
        let write = async move {
            stream.write_all(&[value]).await?;
            stream.flush().await?;
            Ok::<(), TransportError>(())
        };

        match tokio::time::timeout(limit, write).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(limit.as_millis() as u64)),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        info!("Closing alarm device on {}", self.port);
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// In-memory transport for testing and dry runs (no hardware required)
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<u8>>>,
    fail_writes: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far
    pub fn sent(&self) -> Vec<u8> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Make subsequent writes fail (simulates a yanked cable)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl AlarmTransport for MockTransport {
    async fn send_byte(&mut self, value: u8) -> Result<(), TransportError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::Write("mock write failure".into()));
        }
        if self.is_closed() {
            return Err(TransportError::Unavailable);
        }
        self.sent
            .lock()
            .map_err(|e| TransportError::Write(e.to_string()))?
            .push(value);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
