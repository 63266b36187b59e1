use super::PushMessage;

/// Per-call message limit published by the push service. Fixed external
/// constraint, not a tunable.
pub const FCM_BATCH_LIMIT: usize = 500;

/// Split messages into consecutive groups of at most `size`.
///
/// Order is preserved within and across groups; the last group may be
/// shorter; an empty input yields no groups.
pub fn chunk_messages(messages: &[PushMessage], size: usize) -> impl Iterator<Item = &[PushMessage]> {
    messages.chunks(size.max(1))
}
