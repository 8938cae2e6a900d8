const CHANNEL_PREFIX: &str = "/presence/";

/// Channel shared by every client watching a topic
pub fn channel_for_topic(topic_id: u64) -> String {
    format!("{}{}", CHANNEL_PREFIX, topic_id)
}

pub fn topic_from_channel(channel: &str) -> Option<u64> {
    channel.strip_prefix(CHANNEL_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_key_is_deterministic() {
        assert_eq!(channel_for_topic(42), "/presence/42");
        assert_eq!(channel_for_topic(42), channel_for_topic(42));
        assert_eq!(topic_from_channel("/presence/42"), Some(42));
        assert_eq!(topic_from_channel("/other/42"), None);
        assert_eq!(topic_from_channel("/presence/abc"), None);
    }
}
