//! Optional payload-feature flags.

bitflags::bitflags! {
    /// Bit-flag set describing which optional payload features are expected
    /// for a given content type, protocol version and URI shape.
    ///
    /// Computed per exchange, never persisted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ODataPayloadOptions: u16 {
        /// Declared type names are present on values.
        const TYPE_NAMES = 1;
        /// Entity id URIs are present.
        const IDS = 1 << 1;
        /// Edit links are present.
        const EDIT_LINKS = 1 << 2;
        /// Entity tags are present.
        const ETAGS = 1 << 3;
        /// Media/stream links are present on media-link entries.
        const STREAM_LINKS = 1 << 4;
        /// Next-page links may appear on feeds.
        const NEXT_LINKS = 1 << 5;
        /// Inline counts may appear on feeds.
        const INLINE_COUNTS = 1 << 6;
    }
}
