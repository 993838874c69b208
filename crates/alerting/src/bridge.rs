//! Alarm actuator bridge
//!
//! Forwards alarm transitions to the device as single command bytes. Device
//! problems are logged and reported back, never raised: monitoring carries on
//! without a working alarm.

use dms::AlarmTransition;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::transport::{AlarmConfig, AlarmTransport, SerialTransport};

/// Command understood by the alarm device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlarmCommand {
    On,
    Off,
}

impl AlarmCommand {
    /// Wire byte: ASCII '1' raises the alarm, ASCII '0' clears it
    pub fn byte(self) -> u8 {
        match self {
            AlarmCommand::On => b'1',
            AlarmCommand::Off => b'0',
        }
    }

    pub fn for_transition(transition: AlarmTransition) -> Option<Self> {
        match transition {
            AlarmTransition::AlarmOn => Some(AlarmCommand::On),
            AlarmTransition::AlarmOff => Some(AlarmCommand::Off),
            AlarmTransition::NoChange => None,
        }
    }
}

/// What happened to one command
#[derive(Debug)]
pub enum ApplyOutcome {
    /// Nothing to send
    Idle,
    /// Command delivered
    Sent(AlarmCommand),
    /// No device; command dropped
    Unavailable(AlarmCommand),
    /// Device present but the write failed
    Failed(AlarmCommand, TransportError),
}

impl ApplyOutcome {
    pub fn delivered(&self) -> bool {
        matches!(self, ApplyOutcome::Sent(_))
    }
}

/// Counters over the bridge lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    pub commands_sent: u32,
    pub commands_dropped: u32,
    pub write_failures: u32,
}

/// Alarm actuator bridge
pub struct AlarmBridge<T> {
    transport: Option<T>,
    /// Last command decided, whether or not the device received it
    commanded: Option<AlarmCommand>,
    stats: BridgeStats,
}

impl AlarmBridge<SerialTransport> {
    /// Connect to the configured serial device.
    ///
    /// Without a port, or when the port cannot be opened, the bridge runs
    /// permanently without a device.
    pub async fn connect(config: &AlarmConfig) -> Self {
        match SerialTransport::connect(config).await {
            Ok(transport) => Self::new(transport),
            Err(TransportError::Unavailable) => {
                info!("No alarm device configured, running without alarm output");
                Self::unavailable()
            }
            Err(e) => {
                warn!("Error connecting to alarm device: {}", e);
                Self::unavailable()
            }
        }
    }
}

impl<T: AlarmTransport> AlarmBridge<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Some(transport),
            commanded: None,
            stats: BridgeStats::default(),
        }
    }

    /// Bridge with no device
    pub fn unavailable() -> Self {
        Self {
            transport: None,
            commanded: None,
            stats: BridgeStats::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.transport.is_some()
    }

    pub fn commanded(&self) -> Option<AlarmCommand> {
        self.commanded
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Forward one transition to the device (best effort)
    pub async fn apply(&mut self, transition: AlarmTransition) -> ApplyOutcome {
        let Some(command) = AlarmCommand::for_transition(transition) else {
            return ApplyOutcome::Idle;
        };

        match command {
            AlarmCommand::On => info!("Sending ALARM to device"),
            AlarmCommand::Off => info!("Driver woke up, clearing alarm"),
        }

        self.commanded = Some(command);
        self.send(command).await
    }

    /// Command the alarm off and release the device.
    ///
    /// Sends the off command regardless of the current state. Once the
    /// device is released later calls are no-ops.
    pub async fn shutdown(&mut self) -> ApplyOutcome {
        let outcome = self.send(AlarmCommand::Off).await;
        self.commanded = Some(AlarmCommand::Off);

        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                warn!("Failed to close alarm device: {}", e);
            }
        }

        outcome
    }

    async fn send(&mut self, command: AlarmCommand) -> ApplyOutcome {
        let Some(transport) = self.transport.as_mut() else {
            debug!("No alarm device, dropping {:?}", command);
            self.stats.commands_dropped += 1;
            return ApplyOutcome::Unavailable(command);
        };

        match transport.send_byte(command.byte()).await {
            Ok(()) => {
                self.stats.commands_sent += 1;
                ApplyOutcome::Sent(command)
            }
            Err(e) => {
                warn!("Alarm command {:?} not delivered: {}", command, e);
                self.stats.write_failures += 1;
                ApplyOutcome::Failed(command, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[tokio::test]
    async fn test_transitions_map_to_bytes() {
        let mock = MockTransport::new();
        let mut bridge = AlarmBridge::new(mock.clone());

        assert!(matches!(bridge.apply(AlarmTransition::NoChange).await, ApplyOutcome::Idle));
        assert!(bridge.apply(AlarmTransition::AlarmOn).await.delivered());
        assert!(bridge.apply(AlarmTransition::AlarmOff).await.delivered());

        assert_eq!(mock.sent(), vec![b'1', b'0']);
        assert_eq!(bridge.stats().commands_sent, 2);
        assert_eq!(bridge.commanded(), Some(AlarmCommand::Off));
    }

    #[tokio::test]
    async fn test_no_change_performs_no_io() {
        let mock = MockTransport::new();
        let mut bridge = AlarmBridge::new(mock.clone());
        for _ in 0..10 {
            bridge.apply(AlarmTransition::NoChange).await;
        }
        assert!(mock.sent().is_empty());
        assert_eq!(bridge.stats(), BridgeStats::default());
    }

    #[tokio::test]
    async fn test_unavailable_bridge_never_fails() {
        let mut bridge: AlarmBridge<MockTransport> = AlarmBridge::unavailable();
        assert!(!bridge.is_available());

        let outcome = bridge.apply(AlarmTransition::AlarmOn).await;
        assert!(matches!(outcome, ApplyOutcome::Unavailable(AlarmCommand::On)));
        // Logical state is still tracked
        assert_eq!(bridge.commanded(), Some(AlarmCommand::On));

        let outcome = bridge.shutdown().await;
        assert!(matches!(outcome, ApplyOutcome::Unavailable(AlarmCommand::Off)));
        assert_eq!(bridge.stats().commands_dropped, 2);
    }

    #[tokio::test]
    async fn test_write_failure_is_contained() {
        let mock = MockTransport::new();
        let mut bridge = AlarmBridge::new(mock.clone());

        mock.set_fail_writes(true);
        let outcome = bridge.apply(AlarmTransition::AlarmOn).await;
        assert!(matches!(outcome, ApplyOutcome::Failed(AlarmCommand::On, _)));
        assert_eq!(bridge.commanded(), Some(AlarmCommand::On));

        // Device comes back; the next transition goes through
        mock.set_fail_writes(false);
        assert!(bridge.apply(AlarmTransition::AlarmOff).await.delivered());
        assert_eq!(mock.sent(), vec![b'0']);
        assert_eq!(bridge.stats().write_failures, 1);
        assert!(bridge.is_available());
    }

    #[tokio::test]
    async fn test_shutdown_sends_off_and_closes() {
        let mock = MockTransport::new();
        let mut bridge = AlarmBridge::new(mock.clone());

        bridge.apply(AlarmTransition::AlarmOn).await;
        assert!(bridge.shutdown().await.delivered());

        assert_eq!(mock.sent(), vec![b'1', b'0']);
        assert!(mock.is_closed());
        assert!(!bridge.is_available());
    }

    #[tokio::test]
    async fn test_shutdown_when_already_off_sends_off_again() {
        let mock = MockTransport::new();
        let mut bridge = AlarmBridge::new(mock.clone());

        bridge.apply(AlarmTransition::AlarmOn).await;
        bridge.apply(AlarmTransition::AlarmOff).await;
        assert!(bridge.shutdown().await.delivered());
        assert_eq!(mock.sent(), vec![b'1', b'0', b'0']);

        // Released: a second shutdown is a harmless no-op
        let again = bridge.shutdown().await;
        assert!(matches!(again, ApplyOutcome::Unavailable(AlarmCommand::Off)));
        assert_eq!(mock.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_shutdown_with_failing_device_still_releases() {
        let mock = MockTransport::new();
        let mut bridge = AlarmBridge::new(mock.clone());
        mock.set_fail_writes(true);

        let outcome = bridge.shutdown().await;
        assert!(matches!(outcome, ApplyOutcome::Failed(AlarmCommand::Off, _)));
        assert!(mock.is_closed());
    }

    #[tokio::test]
    async fn test_connect_without_port() {
        let bridge = AlarmBridge::connect(&AlarmConfig::default()).await;
        assert!(!bridge.is_available());
    }

    #[test]
    fn test_command_bytes() {
        assert_eq!(AlarmCommand::On.byte(), b'1');
        assert_eq!(AlarmCommand::Off.byte(), b'0');
        assert_eq!(AlarmCommand::for_transition(AlarmTransition::NoChange), None);
    }
}
