use std::fmt;

/// Codepoint substituted for bytes that fail UTF-8 decoding.
pub const REPLACEMENT: u32 = 0xfffd;

/// One decoded character: a codepoint plus the raw bytes it was decoded from.
///
/// For cleanly decoded text the bytes are the canonical UTF-8 encoding of the
/// codepoint. For a byte that failed decoding the codepoint is `REPLACEMENT`
/// and the single source byte is kept verbatim, so a load/save cycle of a file
/// containing malformed sequences is byte-identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextUnit {
    pub codepoint: u32,
    bytes: [u8; 4],
    len: u8,
}

impl TextUnit {
    pub fn from_char(ch: char) -> Self {
        let mut bytes = [0u8; 4];
        let len = ch.encode_utf8(&mut bytes).len() as u8;
        Self {
            codepoint: ch as u32,
            bytes,
            len,
        }
    }

    /// A unit standing in for a single byte that failed to decode.
    pub fn malformed(byte: u8) -> Self {
        Self {
            codepoint: REPLACEMENT,
            bytes: [byte, 0, 0, 0],
            len: 1,
        }
    }

    /// The "no visible character" sentinel returned by the input engine when a
    /// key was consumed by a bind or is part of a pending chord.
    pub fn sentinel() -> Self {
        Self::from_char('\u{fffd}')
    }

    /// True if this unit came through the decode error path. A genuine U+FFFD
    /// carries its canonical 3-byte encoding; an escaped byte carries 1.
    pub fn is_malformed(&self) -> bool {
        self.codepoint == REPLACEMENT && self.len == 1
    }

    pub fn encoding(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The codepoint as a `char`, substituting U+FFFD for anything that is not
    /// a valid scalar value.
    pub fn to_char(&self) -> char {
        char::from_u32(self.codepoint).unwrap_or('\u{fffd}')
    }

    pub fn is_space(&self) -> bool {
        self.to_char().is_whitespace()
    }

    pub fn is_alnum(&self) -> bool {
        let ch = self.to_char();
        ch.is_alphanumeric() || ch == '_'
    }

    /// Printable means "occupies a cell when echoed". Control characters and
    /// the sentinel do not.
    pub fn is_print(&self) -> bool {
        let ch = self.to_char();
        !ch.is_control() && self.codepoint != REPLACEMENT
    }
}

/// An ordered, randomly indexable sequence of text units. `Vec` supplies the
/// geometric growth that keeps arbitrary-offset insertion amortized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    units: Vec<TextUnit>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self { units: Vec::new() }
    }

    pub fn from_str(text: &str) -> Self {
        Self {
            units: text.chars().map(TextUnit::from_char).collect(),
        }
    }

    /// Decode raw bytes. Invalid sequences degrade to replacement units one
    /// byte at a time; the bytes after the bad one are re-examined, so a
    /// single stray continuation byte does not eat the rest of the line.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut units = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            match decode_utf8(&bytes[i..]) {
                Some((ch, width)) => {
                    units.push(TextUnit::from_char(ch));
                    i += width;
                }
                None => {
                    units.push(TextUnit::malformed(bytes[i]));
                    i += 1;
                }
            }
        }
        Self { units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<TextUnit> {
        self.units.get(idx).copied()
    }

    /// Codepoint at `idx`, or 0 when out of range. Scanning loops read past
    /// either end of the buffer freely with this.
    pub fn codepoint(&self, idx: usize) -> u32 {
        self.units.get(idx).map_or(0, |u| u.codepoint)
    }

    pub fn units(&self) -> &[TextUnit] {
        &self.units
    }

    pub fn push(&mut self, unit: TextUnit) {
        self.units.push(unit);
    }

    /// Insert one unit, shifting everything at and after `at` right.
    /// Out-of-range offsets are a no-op; callers validate against the cursor.
    pub fn insert_unit(&mut self, at: usize, unit: TextUnit) {
        if at <= self.units.len() {
            self.units.insert(at, unit);
        }
    }

    /// Insert a sequence at `at`.
    pub fn insert(&mut self, at: usize, units: &[TextUnit]) {
        if at <= self.units.len() {
            self.units.splice(at..at, units.iter().copied());
        }
    }

    /// Remove the half-open range `[lb, ub)`, shifting the tail left.
    pub fn erase(&mut self, lb: usize, ub: usize) {
        if lb < ub && ub <= self.units.len() {
            self.units.drain(lb..ub);
        }
    }

    /// A detached copy of the half-open range `[lb, ub)`.
    pub fn substring(&self, lb: usize, ub: usize) -> TextBuffer {
        if lb < ub && ub <= self.units.len() {
            TextBuffer {
                units: self.units[lb..ub].to_vec(),
            }
        } else {
            TextBuffer::new()
        }
    }

    /// Flatten back to encoded bytes for file I/O. Units decoded via the error
    /// path contribute their original byte, not a re-encoded U+FFFD.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.units.len());
        for unit in &self.units {
            out.extend_from_slice(unit.encoding());
        }
        out
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for unit in &self.units {
            write!(f, "{}", unit.to_char())?;
        }
        Ok(())
    }
}

/// Decode the first scalar value of `bytes`. Returns the char and how many
/// bytes it consumed, or None if the head is not a valid UTF-8 sequence.
fn decode_utf8(bytes: &[u8]) -> Option<(char, usize)> {
    let first = *bytes.first()?;
    if first < 0x80 {
        return Some((first as char, 1));
    }

    let (width, init) = match first {
        0xc2..=0xdf => (2, (first & 0x1f) as u32),
        0xe0..=0xef => (3, (first & 0x0f) as u32),
        0xf0..=0xf4 => (4, (first & 0x07) as u32),
        _ => return None,
    };

    if bytes.len() < width {
        return None;
    }

    let mut codepoint = init;
    for &b in &bytes[1..width] {
        if b & 0xc0 != 0x80 {
            return None;
        }
        codepoint = codepoint << 6 | (b & 0x3f) as u32;
    }

    char::from_u32(codepoint).map(|ch| (ch, width))
}
