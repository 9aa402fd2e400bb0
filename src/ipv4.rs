use std::net::Ipv4Addr;

/// The IPv4 header fields the controller cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub source: Ipv4Addr,
    /// Type-of-service byte.
    pub marking: u8,
    pub header_len: usize,
}

impl Ipv4Header {
    /// `None` unless `packet` starts with a complete IPv4 header.
    pub fn parse(packet: &[u8]) -> Option<Self> {
        // 1. minimum header
        if packet.len() < 20 {
            return None;
        }

        // 2. version nibble
        if (packet[0] >> 4) != 4 {
            return None;
        }

        // 3. IHL counts 32-bit words
        let header_len = (packet[0] & 0x0F) as usize * 4;
        if header_len < 20 || packet.len() < header_len {
            return None;
        }

        Some(Self {
            source: Ipv4Addr::new(packet[12], packet[13], packet[14], packet[15]),
            marking: packet[1],
            header_len,
        })
    }
}

/// Internet checksum over the header with the checksum field taken as zero.
fn header_checksum(header: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    for (i, pair) in header.chunks(2).enumerate() {
        if i == 5 {
            continue;
        }
        let word = match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [hi] => u16::from_be_bytes([*hi, 0]),
            _ => 0,
        };
        sum += word as u32;
    }
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// Rewrites the ToS byte and fixes the header checksum.
/// Returns false if the packet is not IPv4 or already carries `marking`.
pub fn rewrite_marking(packet: &mut [u8], marking: u8) -> bool {
    let Some(header) = Ipv4Header::parse(packet) else {
        return false;
    };
    if header.marking == marking {
        return false;
    }

    packet[1] = marking;
    let checksum = header_checksum(&packet[..header.header_len]);
    packet[10..12].copy_from_slice(&checksum.to_be_bytes());
    true
}

/// Copy of `packet` carrying `marking`, or `None` when no rewrite is needed.
/// The copy is only made once the header is known to differ.
pub fn remarked(packet: &[u8], marking: u8) -> Option<Vec<u8>> {
    let header = Ipv4Header::parse(packet)?;
    if header.marking == marking {
        return None;
    }
    let mut bytes = packet.to_vec();
    rewrite_marking(&mut bytes, marking).then_some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 20-byte UDP header, 10.0.0.1 -> 10.0.0.2, ToS 0xb8
    fn sample() -> Vec<u8> {
        let mut packet = vec![
            0x45, 0xb8, 0x00, 0x1c, 0x12, 0x34, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00, 10, 0, 0, 1,
            10, 0, 0, 2, 0x00, 0x35, 0x00, 0x35, 0x00, 0x08, 0x00, 0x00,
        ];
        let checksum = header_checksum(&packet[..20]);
        packet[10..12].copy_from_slice(&checksum.to_be_bytes());
        packet
    }

    fn verifies(header: &[u8]) -> bool {
        let mut sum: u32 = header
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) as u32)
            .sum();
        while sum > 0xFFFF {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
        sum == 0xFFFF
    }

    #[test]
    fn parses_marking_and_source() {
        let header = Ipv4Header::parse(&sample()).unwrap();
        assert_eq!(header.marking, 0xb8);
        assert_eq!(header.source, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(header.header_len, 20);
    }

    #[test]
    fn rejects_short_and_non_ipv4() {
        assert!(Ipv4Header::parse(&[0x45; 10]).is_none());

        let mut v6 = sample();
        v6[0] = 0x60;
        assert!(Ipv4Header::parse(&v6).is_none());

        let mut bad_ihl = sample();
        bad_ihl[0] = 0x4f;
        assert!(Ipv4Header::parse(&bad_ihl).is_none());
    }

    #[test]
    fn rewrite_keeps_checksum_valid() {
        let mut packet = sample();
        assert!(verifies(&packet[..20]));

        assert!(rewrite_marking(&mut packet, 0x20));
        assert_eq!(packet[1], 0x20);
        assert!(verifies(&packet[..20]));

        assert!(!rewrite_marking(&mut packet, 0x20));
        assert!(!rewrite_marking(&mut [0u8; 4], 0x20));
    }

    #[test]
    fn remarked_copies_only_on_change() {
        let packet = sample();
        assert_eq!(remarked(&packet, 0xb8), None);
        assert_eq!(remarked(&[0x60; 40], 0x20), None);

        let copy = remarked(&packet, 0x20).unwrap();
        assert_eq!(Ipv4Header::parse(&copy).map(|h| h.marking), Some(0x20));
        assert!(verifies(&copy[..20]));
        assert_eq!(packet[1], 0xb8);
    }
}
