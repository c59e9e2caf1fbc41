//! HELLO / ROUTINGID / ROUTING frame parsing and emission.
//!
//! Parsing is deliberately tolerant: a malformed header drops the whole
//! frame, but a malformed entry inside an otherwise-valid ROUTINGID frame is
//! skipped without aborting the rest (see `parse_routingid`) — one bad
//! neighbor's entry should never poison the whole vector.

use crate::identity::NodeId;
use crate::mac::{find_mac_token, Mac};

pub const MAX_FRAME_LEN: usize = 230;

/// One advertised `(dest, rssi, cost, next_hop)` tuple inside a ROUTINGID
/// frame, before filler/self-reference suppression is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorEntry {
    pub destination: NodeId,
    pub rssi: i16,
    pub cost: i32,
    pub next_hop_id: NodeId,
}

/// A frame successfully classified and parsed off the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Hello { mac: Mac },
    RoutingId { sender_id: NodeId, entries: Vec<VectorEntry> },
    /// Legacy MAC-based vector format: recognized so old firmware on the
    /// same mesh doesn't trip the unprintable/oversized-frame error paths,
    /// but its content is never interpreted.
    LegacyRouting,
}

/// Framing-level rejection reasons, checked before any content parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    #[error("frame of {0} bytes exceeds the 230 byte limit")]
    TooLong(usize),
    #[error("frame contains a non-printable byte")]
    NonPrintable,
}

/// Validates the framing rules common to every inbound byte buffer: length
/// and printability. Content-level parsing happens only after this passes.
pub fn check_framing(bytes: &[u8]) -> Result<&str, FramingError> {
    if bytes.len() > MAX_FRAME_LEN {
        return Err(FramingError::TooLong(bytes.len()));
    }
    if bytes.iter().any(|&b| !(0x20..=0x7E).contains(&b)) {
        return Err(FramingError::NonPrintable);
    }
    // Framing already guarantees ASCII printable, so this cannot fail.
    Ok(std::str::from_utf8(bytes).expect("printable ASCII is valid UTF-8"))
}

/// Parses a framing-valid ASCII payload into a [`Frame`], or `None` if it
/// matches none of the known shapes (dropped silently).
pub fn parse(text: &str) -> Option<Frame> {
    if text.starts_with("ROUTINGID|") {
        return parse_routingid(text).map(|(sender_id, entries)| Frame::RoutingId { sender_id, entries });
    }
    if text.starts_with("ROUTING|") {
        return Some(Frame::LegacyRouting);
    }
    if text.contains("MAC:") {
        return find_mac_token(text).map(|mac| Frame::Hello { mac });
    }
    None
}

/// Emits a HELLO frame: `Hello from NODE_<id> MAC: <MAC>`.
pub fn encode_hello(own_id: NodeId, own_mac: Mac) -> String {
    format!("Hello from NODE_{own_id} MAC: {own_mac}")
}

/// Parses `ROUTINGID|<sender_id>|<e1>|<e2>|...|`. Returns `None` if the
/// header (first two pipe-delimited fields) is malformed; individual
/// malformed entries are skipped and do not abort the frame.
fn parse_routingid(text: &str) -> Option<(NodeId, Vec<VectorEntry>)> {
    let rest = text.strip_prefix("ROUTINGID|")?;
    let mut fields = rest.split('|');
    let sender_field = fields.next()?;
    let sender_id: i64 = sender_field.parse().ok()?;
    if sender_id < 0 || sender_id > NodeId::MAX as i64 {
        return None;
    }
    let sender_id = sender_id as NodeId;

    let mut entries = Vec::new();
    for field in fields {
        if field.is_empty() {
            // trailing empty field after the mandatory final pipe
            continue;
        }
        if let Some(entry) = parse_vector_entry(field) {
            entries.push(entry);
        }
    }
    Some((sender_id, entries))
}

fn parse_vector_entry(field: &str) -> Option<VectorEntry> {
    let mut parts = field.split(',');
    let destination: i64 = parts.next()?.parse().ok()?;
    let rssi: i32 = parts.next()?.parse().ok()?;
    let cost: i64 = parts.next()?.parse().ok()?;
    let next_hop_id: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None; // wrong arity
    }
    if destination < 0 || destination > NodeId::MAX as i64 {
        return None;
    }
    if next_hop_id < 0 || next_hop_id > NodeId::MAX as i64 {
        return None;
    }
    Some(VectorEntry {
        destination: destination as NodeId,
        rssi: rssi as i16,
        cost: cost as i32,
        next_hop_id: next_hop_id as NodeId,
    })
}

/// Applies the ROUTINGID entry-level filtering rules (self-reference,
/// filler suppression) to one already-parsed entry. Returns `false` if the
/// entry should be skipped.
pub fn entry_is_admissible(entry: &VectorEntry, sender_id: NodeId, own_id: NodeId) -> bool {
    if entry.destination == own_id {
        return false;
    }
    if entry.cost <= 0 && entry.destination != sender_id {
        return false;
    }
    if entry.destination == 0 && entry.rssi == 0 && entry.cost == 0 && entry.next_hop_id == 0 {
        return false;
    }
    true
}

/// Serializes one eligible row into its `<dest>,<rssi>,<cost>,<next_hop>|` form.
pub fn encode_vector_entry(entry: &VectorEntry) -> String {
    format!(
        "{},{},{},{}|",
        entry.destination, entry.rssi, entry.cost, entry.next_hop_id
    )
}

/// Serializes the ROUTINGID header: `ROUTINGID|<own_id>|`.
pub fn encode_routingid_header(own_id: NodeId) -> String {
    format!("ROUTINGID|{own_id}|")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(n: u8) -> Mac {
        Mac::new([0, 0, 0, 0, 0, n])
    }

    #[test]
    fn check_framing_rejects_oversized() {
        let bytes = vec![b'a'; MAX_FRAME_LEN + 1];
        assert_eq!(check_framing(&bytes), Err(FramingError::TooLong(MAX_FRAME_LEN + 1)));
    }

    #[test]
    fn check_framing_rejects_non_printable() {
        let bytes = vec![b'a', 0x01, b'b'];
        assert_eq!(check_framing(&bytes), Err(FramingError::NonPrintable));
    }

    #[test]
    fn hello_roundtrip() {
        let encoded = encode_hello(3, mac(9));
        let parsed = parse(&encoded).unwrap();
        assert_eq!(parsed, Frame::Hello { mac: mac(9) });
    }

    #[test]
    fn hello_parsing_is_tolerant_of_prefix_noise() {
        let parsed = parse("garbage garbage MAC: 00:00:00:00:00:09 trailer").unwrap();
        assert_eq!(parsed, Frame::Hello { mac: mac(9) });
    }

    #[test]
    fn routingid_parses_well_formed_frame() {
        let parsed = parse("ROUTINGID|1|2,-60,60,2|").unwrap();
        assert_eq!(
            parsed,
            Frame::RoutingId {
                sender_id: 1,
                entries: vec![VectorEntry { destination: 2, rssi: -60, cost: 60, next_hop_id: 2 }],
            }
        );
    }

    #[test]
    fn routingid_skips_malformed_entry_but_keeps_the_rest() {
        let parsed = parse("ROUTINGID|1|2,-60,60,2|not,a,tuple|3,-70,70,1|").unwrap();
        match parsed {
            Frame::RoutingId { sender_id, entries } => {
                assert_eq!(sender_id, 1);
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].destination, 2);
                assert_eq!(entries[1].destination, 3);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn routingid_malformed_header_drops_whole_frame() {
        assert_eq!(parse("ROUTINGID|not-a-number|2,-60,60,2|"), None);
    }

    #[test]
    fn legacy_routing_is_recognized_and_opaque() {
        assert_eq!(parse("ROUTING|whatever legacy payload"), Some(Frame::LegacyRouting));
    }

    #[test]
    fn entry_admissibility_filters_self_and_filler() {
        let own_id = 5;
        let sender = 1;
        let self_entry = VectorEntry { destination: own_id, rssi: -10, cost: 10, next_hop_id: 1 };
        assert!(!entry_is_admissible(&self_entry, sender, own_id));

        let filler = VectorEntry { destination: 0, rssi: 0, cost: 0, next_hop_id: 0 };
        assert!(!entry_is_admissible(&filler, sender, own_id));

        let non_positive_cost = VectorEntry { destination: 3, rssi: -10, cost: 0, next_hop_id: 1 };
        assert!(!entry_is_admissible(&non_positive_cost, sender, own_id));

        // Sender's own self-entry with non-positive cost IS allowed (dest == sender).
        let sender_self = VectorEntry { destination: sender, rssi: -10, cost: 0, next_hop_id: sender };
        assert!(entry_is_admissible(&sender_self, sender, own_id));

        let normal = VectorEntry { destination: 2, rssi: -60, cost: 60, next_hop_id: 2 };
        assert!(entry_is_admissible(&normal, sender, own_id));
    }
}
