bitflags::bitflags! {
    /// Per-option flags.
    ///
    /// The decoder only carries these; they affect storage attributes and
    /// widget rendering, never parsing. Unknown bits are kept.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OptionFlags: u32 {
        /// Value may not be changed; the backing variable is locked.
        const READONLY = 1 << 0;
        /// Option is inactive at load time (a dependency is unmet). Producers
        /// use this bit to request gray-out.
        const INACTIVE = 1 << 1;
        /// Hide the widget.
        const SUPPRESS = 1 << 2;
        /// Backing variable does not persist across resets.
        const VOLATILE = 1 << 3;
        /// Backing variable stays accessible at OS runtime. Local extension,
        /// not defined by current producers.
        const RUNTIME = 1 << 4;
        /// Show the widget but refuse input. Local extension, not defined by
        /// current producers; they gray out through [`Self::INACTIVE`].
        const GRAYOUT = 1 << 5;

        const _ = !0;
    }
}

impl OptionFlags {
    /// Whether a renderer should show this option grayed out.
    #[must_use]
    pub const fn is_grayed_out(self) -> bool {
        self.intersects(Self::GRAYOUT.union(Self::INACTIVE))
    }
}
