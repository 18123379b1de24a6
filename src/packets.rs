//! UBX class/ID constants and builders for the configuration packets this
//! driver exchanges.

use bitflags::bitflags;

use crate::frame::Frame;

pub const CLASS_NAV: u8 = 0x01;
pub const CLASS_RXM: u8 = 0x02;
pub const CLASS_INF: u8 = 0x04;
pub const CLASS_ACK: u8 = 0x05;
pub const CLASS_CFG: u8 = 0x06;
pub const CLASS_MON: u8 = 0x0a;
pub const CLASS_TIM: u8 = 0x0d;

pub const ACK_NAK: u8 = 0x00;
pub const ACK_ACK: u8 = 0x01;

pub const CFG_PRT: u8 = 0x00;
pub const CFG_MSG: u8 = 0x01;
pub const CFG_RATE: u8 = 0x08;
pub const CFG_ANT: u8 = 0x13;
pub const CFG_NAV5: u8 = 0x24;

pub const RXM_PMREQ: u8 = 0x41;

/// CFG-NAV5 carries a fixed 36-byte payload.
pub const CFG_NAV5_PAYLOAD_LEN: usize = 36;
/// Offset of the dynamic platform model byte within the CFG-NAV5 payload.
pub const NAV5_DYN_MODEL_OFFSET: usize = 2;

/// Dynamic platform model (CFG-NAV5 `dynModel`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NavMode {
    Portable = 0,
    /// Stationary, for timing purposes.
    Stationary = 2,
    Pedestrian = 3,
    Automotive = 4,
    Sea = 5,
    /// Airborne, max vertical velocity 100 m/s.
    Airborne1g = 6,
    /// Airborne, max vertical velocity 250 m/s.
    Airborne2g = 7,
    /// Airborne, max vertical velocity 500 m/s.
    Airborne4g = 8,
}

bitflags! {
    /// CFG-ANT control flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AntennaFlags: u16 {
        /// Enable antenna supply voltage control.
        const SVCS = 0x0001;
        /// Enable short-circuit detection.
        const SCD = 0x0002;
        /// Enable open-circuit detection.
        const OCD = 0x0004;
        /// Power down antenna supply on short circuit.
        const PDWN_ON_SCD = 0x0008;
        /// Enable automatic recovery from short state.
        const RECOVERY = 0x0010;
    }
}

bitflags! {
    /// RXM-PMREQ request flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PmReqFlags: u32 {
        /// Enter backup mode, retaining navigation data.
        const BACKUP = 0x0000_0002;
    }
}

/// Builds a CFG-ANT write configuring the antenna bias supervisor.
#[derive(Debug, Clone, Copy)]
pub struct CfgAntBuilder {
    pub flags: AntennaFlags,
    /// Packed supervisor pin configuration word.
    pub pins: u16,
}

impl CfgAntBuilder {
    pub fn into_frame(self) -> Frame {
        let mut payload = Vec::with_capacity(4);
        payload.extend_from_slice(&self.flags.bits().to_le_bytes());
        payload.extend_from_slice(&self.pins.to_le_bytes());
        Frame::new(CLASS_CFG, CFG_ANT, payload)
    }
}

/// Builds an RXM-PMREQ power management request.
#[derive(Debug, Clone, Copy)]
pub struct RxmPmReqBuilder {
    /// Requested task duration; 0 means until an external wake-up.
    pub duration_ms: u32,
    pub flags: PmReqFlags,
}

impl RxmPmReqBuilder {
    pub fn into_frame(self) -> Frame {
        let mut payload = Vec::with_capacity(8);
        payload.extend_from_slice(&self.duration_ms.to_le_bytes());
        payload.extend_from_slice(&self.flags.bits().to_le_bytes());
        Frame::new(CLASS_RXM, RXM_PMREQ, payload)
    }
}

/// Empty-payload CFG-NAV5 poll; the receiver answers with its current
/// navigation engine settings.
pub fn poll_nav5() -> Frame {
    Frame::new(CLASS_CFG, CFG_NAV5, Vec::new())
}

/// True when `frame` is an ACK-ACK whose payload echoes the given class/id.
pub fn is_ack_for(frame: &Frame, class: u8, id: u8) -> bool {
    frame.class == CLASS_ACK
        && frame.id == ACK_ACK
        && frame.payload.first() == Some(&class)
        && frame.payload.get(1) == Some(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cfg_ant_wire_bytes() {
        let frame = CfgAntBuilder {
            flags: AntennaFlags::SVCS,
            pins: 0x8016,
        }
        .into_frame();
        assert_eq!(frame.class, CLASS_CFG);
        assert_eq!(frame.id, CFG_ANT);
        assert_eq!(frame.payload, [0x01, 0x00, 0x16, 0x80]);
    }

    #[test]
    fn pmreq_backup_wire_bytes() {
        let frame = RxmPmReqBuilder {
            duration_ms: 0,
            flags: PmReqFlags::BACKUP,
        }
        .into_frame();
        assert_eq!(frame.class, CLASS_RXM);
        assert_eq!(frame.id, RXM_PMREQ);
        assert_eq!(frame.payload, [0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn ack_matching() {
        let ack = Frame::new(CLASS_ACK, ACK_ACK, vec![CLASS_CFG, CFG_ANT]);
        assert!(is_ack_for(&ack, CLASS_CFG, CFG_ANT));
        assert!(!is_ack_for(&ack, CLASS_CFG, CFG_NAV5));

        let nak = Frame::new(CLASS_ACK, ACK_NAK, vec![CLASS_CFG, CFG_ANT]);
        assert!(!is_ack_for(&nak, CLASS_CFG, CFG_ANT));

        let short = Frame::new(CLASS_ACK, ACK_ACK, Vec::new());
        assert!(!is_ack_for(&short, CLASS_CFG, CFG_ANT));
    }
}
