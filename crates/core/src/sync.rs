//! Delivery classification and id generation for the offline write queue.

use rand::Rng;

/// What the sync engine should do after one delivery attempt, by HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 2xx: the operation reached the server; remove it from the queue.
    Delivered,
    /// Session or outage condition: stop the drain pass, keep the operation
    /// and everything after it for a later retry.
    Halt,
    /// Permanently rejected: remove the operation and move on to the next,
    /// so the queue cannot jam on a request that can never succeed.
    Drop,
}

/// Classify an HTTP status into drain behavior.
///
/// 401/403 and every status >= 500 halt the pass; any other non-2xx
/// (409 and 422 included) is dropped.
pub fn classify_status(status: u16) -> Disposition {
    match status {
        200..=299 => Disposition::Delivered,
        401 | 403 => Disposition::Halt,
        500.. => Disposition::Halt,
        _ => Disposition::Drop,
    }
}

/// Generate a queue operation id: enqueue timestamp plus a random suffix.
pub fn operation_id(now_millis: i64) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    format!("{now_millis}-{suffix:06x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_are_delivered() {
        assert_eq!(classify_status(200), Disposition::Delivered);
        assert_eq!(classify_status(201), Disposition::Delivered);
        assert_eq!(classify_status(204), Disposition::Delivered);
    }

    #[test]
    fn auth_and_server_errors_halt() {
        assert_eq!(classify_status(401), Disposition::Halt);
        assert_eq!(classify_status(403), Disposition::Halt);
        assert_eq!(classify_status(500), Disposition::Halt);
        assert_eq!(classify_status(503), Disposition::Halt);
    }

    #[test]
    fn other_client_errors_are_dropped() {
        assert_eq!(classify_status(400), Disposition::Drop);
        assert_eq!(classify_status(404), Disposition::Drop);
        assert_eq!(classify_status(409), Disposition::Drop);
        assert_eq!(classify_status(422), Disposition::Drop);
    }

    #[test]
    fn operation_id_embeds_timestamp_and_suffix() {
        let id = operation_id(1_700_000_000_000);
        let (timestamp, suffix) = id.split_once('-').expect("id has a dash");
        assert_eq!(timestamp, "1700000000000");
        assert_eq!(suffix.len(), 6);
        assert!(u32::from_str_radix(suffix, 16).is_ok());
    }
}
