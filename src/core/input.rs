use std::cmp::Ordering;

use super::text::TextUnit;

/// Longest chord the engine will accumulate before giving up and resetting.
pub const MAX_CHORD_LEN: usize = 16;

/// Where raw keys come from. The terminal backend implements this over
/// blocking crossterm reads; tests feed a scripted sequence.
pub trait KeySource {
    /// Block until one key is available and return it as a text unit.
    fn read(&mut self) -> TextUnit;
}

/// A scripted key source. Returns the sentinel once exhausted, so a runaway
/// loop in a test spins on no-ops instead of blocking forever.
#[derive(Debug, Default)]
pub struct ScriptedKeys {
    keys: Vec<TextUnit>,
    next: usize,
}

impl ScriptedKeys {
    pub fn new(text: &str) -> Self {
        Self {
            keys: text.chars().map(TextUnit::from_char).collect(),
            next: 0,
        }
    }

    pub fn from_units(keys: Vec<TextUnit>) -> Self {
        Self { keys, next: 0 }
    }

    pub fn push_str(&mut self, text: &str) {
        self.keys.extend(text.chars().map(TextUnit::from_char));
    }

    pub fn push(&mut self, unit: TextUnit) {
        self.keys.push(unit);
    }

    pub fn exhausted(&self) -> bool {
        self.next >= self.keys.len()
    }
}

impl KeySource for ScriptedKeys {
    fn read(&mut self) -> TextUnit {
        let unit = self.keys.get(self.next).copied();
        self.next += 1;
        unit.unwrap_or_else(TextUnit::sentinel)
    }
}

/// One chord-to-action binding. `C` is the action payload; the editor binds
/// `Command` values and dispatches them with a match.
#[derive(Debug, Clone)]
struct Bind<C> {
    chord: Vec<TextUnit>,
    action: C,
}

/// Lexicographic comparison over codepoints. A chord that is a prefix of the
/// other compares Equal, which is what makes binary search double as prefix
/// discovery.
fn cmp_chords(lhs: &[TextUnit], rhs: &[TextUnit]) -> Ordering {
    for (l, r) in lhs.iter().zip(rhs.iter()) {
        match l.codepoint.cmp(&r.codepoint) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

/// What one `read_key` call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome<C> {
    /// The chord matched a bind exactly; the action should be dispatched.
    Command(C),
    /// The chord is a prefix of at least one bind; keep accumulating.
    Pending,
    /// No bind matched; the raw key falls through for default handling.
    Literal(TextUnit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MacroMode {
    Idle,
    Recording,
    Executing,
}

/// The keybind table plus input state: the accumulating chord and the macro
/// tape. The table is rebuilt wholesale on every editor mode switch.
pub struct InputEngine<C> {
    binds: Vec<Bind<C>>,
    organized: bool,
    chord: Vec<TextUnit>,
    macro_mode: MacroMode,
    tape: Vec<TextUnit>,
    tape_pos: usize,
}

impl<C: Copy> InputEngine<C> {
    pub fn new() -> Self {
        Self {
            binds: Vec::new(),
            organized: true,
            chord: Vec::new(),
            macro_mode: MacroMode::Idle,
            tape: Vec::new(),
            tape_pos: 0,
        }
    }

    /// Drop every bind and reset the pending chord. Called before installing
    /// a new table.
    pub fn unbind_all(&mut self) {
        self.binds.clear();
        self.chord.clear();
        self.organized = true;
    }

    /// Register a chord. Rebinding an existing chord overwrites its action.
    /// `organize` must run after a batch of binds before any lookup.
    pub fn bind(&mut self, chord: Vec<TextUnit>, action: C) {
        if let Some(existing) = self.binds.iter_mut().find(|b| {
            b.chord.len() == chord.len() && cmp_chords(&b.chord, &chord) == Ordering::Equal
        }) {
            existing.action = action;
            return;
        }
        self.binds.push(Bind { chord, action });
        self.organized = false;
    }

    /// Sort the table for binary-search lookup.
    pub fn organize(&mut self) {
        self.binds.sort_by(|a, b| cmp_chords(&a.chord, &b.chord));
        self.organized = true;
    }

    pub fn is_empty(&self) -> bool {
        self.binds.is_empty()
    }

    /// Read one raw key: from the executing macro tape if one is replaying,
    /// otherwise from `source` (appending to the tape while recording).
    pub fn read_raw(&mut self, source: &mut dyn KeySource) -> TextUnit {
        if self.macro_mode == MacroMode::Executing {
            // The final tape entry is the key that triggered macro execution;
            // replaying it would re-trigger the macro forever.
            if self.tape_pos + 1 < self.tape.len() {
                let unit = self.tape[self.tape_pos];
                self.tape_pos += 1;
                return unit;
            }
            self.macro_mode = MacroMode::Idle;
            self.chord.clear();
            return source.read();
        }

        let unit = source.read();
        if self.macro_mode == MacroMode::Recording {
            self.tape.push(unit);
        }
        unit
    }

    /// Read one key and resolve it against the bind table.
    pub fn read_key(&mut self, source: &mut dyn KeySource) -> KeyOutcome<C> {
        debug_assert!(self.organized, "lookup before organize");

        let unit = self.read_raw(source);
        if self.binds.is_empty() {
            return KeyOutcome::Literal(unit);
        }

        if self.chord.len() >= MAX_CHORD_LEN {
            self.chord.clear();
        }
        self.chord.push(unit);

        let mut lo = 0;
        let mut hi = self.binds.len();
        let mut found = None;
        while lo < hi {
            let mid = (lo + hi) / 2;
            match cmp_chords(&self.chord, &self.binds[mid].chord) {
                Ordering::Less => hi = mid,
                Ordering::Greater => lo = mid + 1,
                Ordering::Equal => {
                    found = Some(mid);
                    break;
                }
            }
        }

        let Some(mid) = found else {
            self.chord.clear();
            return KeyOutcome::Literal(unit);
        };

        // Binary search landed somewhere in the cluster of prefix-related
        // binds. Scan the whole cluster for an exact-length match so the
        // outcome does not depend on which member the search hit.
        let mut first = mid;
        while first > 0
            && cmp_chords(&self.chord, &self.binds[first - 1].chord) == Ordering::Equal
        {
            first -= 1;
        }
        let mut i = first;
        while i < self.binds.len()
            && cmp_chords(&self.chord, &self.binds[i].chord) == Ordering::Equal
        {
            if self.binds[i].chord.len() == self.chord.len() {
                self.chord.clear();
                return KeyOutcome::Command(self.binds[i].action);
            }
            i += 1;
        }

        KeyOutcome::Pending
    }

    /// Clear the tape and start recording every raw key.
    pub fn record_macro(&mut self) {
        self.tape.clear();
        self.tape_pos = 0;
        self.macro_mode = MacroMode::Recording;
    }

    pub fn stop_recording(&mut self) {
        self.macro_mode = MacroMode::Idle;
    }

    pub fn is_recording(&self) -> bool {
        self.macro_mode == MacroMode::Recording
    }

    /// Replay the tape from the beginning (excluding its final key).
    pub fn execute_macro(&mut self) {
        self.macro_mode = MacroMode::Executing;
        self.tape_pos = 0;
    }
}

impl<C: Copy> Default for InputEngine<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(text: &str) -> Vec<TextUnit> {
        text.chars().map(TextUnit::from_char).collect()
    }

    fn read_all(engine: &mut InputEngine<u32>, source: &mut ScriptedKeys) -> Vec<KeyOutcome<u32>> {
        let mut out = Vec::new();
        while !source.exhausted() {
            out.push(engine.read_key(source));
        }
        out
    }

    fn commands(outcomes: &[KeyOutcome<u32>]) -> Vec<u32> {
        outcomes
            .iter()
            .filter_map(|o| match o {
                KeyOutcome::Command(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_single_key_bind() {
        let mut engine = InputEngine::new();
        engine.bind(chord("u"), 1u32);
        engine.organize();

        let mut keys = ScriptedKeys::new("u");
        assert_eq!(engine.read_key(&mut keys), KeyOutcome::Command(1));
    }

    #[test]
    fn test_multi_key_chord_pends_then_fires() {
        let mut engine = InputEngine::new();
        engine.bind(chord("qc"), 1u32);
        engine.bind(chord("qd"), 2u32);
        engine.organize();

        let mut keys = ScriptedKeys::new("qd");
        assert_eq!(engine.read_key(&mut keys), KeyOutcome::Pending);
        assert_eq!(engine.read_key(&mut keys), KeyOutcome::Command(2));
    }

    #[test]
    fn test_unbound_key_falls_through() {
        let mut engine = InputEngine::new();
        engine.bind(chord("x"), 1u32);
        engine.organize();

        let mut keys = ScriptedKeys::new("a");
        match engine.read_key(&mut keys) {
            KeyOutcome::Literal(u) => assert_eq!(u.codepoint, 'a' as u32),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_chord_resets() {
        let mut engine = InputEngine::new();
        engine.bind(chord("qc"), 1u32);
        engine.organize();

        // "qx" fails; a following "qc" must start from a clean chord.
        let mut keys = ScriptedKeys::new("qxqc");
        let outcomes = read_all(&mut engine, &mut keys);
        assert_eq!(commands(&outcomes), vec![1]);
    }

    #[test]
    fn test_rebind_overwrites() {
        let mut engine = InputEngine::new();
        engine.bind(chord("u"), 1u32);
        engine.bind(chord("u"), 2u32);
        engine.organize();

        let mut keys = ScriptedKeys::new("u");
        assert_eq!(engine.read_key(&mut keys), KeyOutcome::Command(2));
    }

    #[test]
    fn test_exact_match_wins_over_longer_sibling() {
        let mut engine = InputEngine::new();
        engine.bind(chord("g"), 1u32);
        engine.bind(chord("gg"), 2u32);
        engine.organize();

        let mut keys = ScriptedKeys::new("g");
        assert_eq!(engine.read_key(&mut keys), KeyOutcome::Command(1));
    }

    #[test]
    fn test_dispatch_is_deterministic() {
        let script = "qcahqdz";
        let run = || {
            let mut engine = InputEngine::new();
            engine.bind(chord("qc"), 1u32);
            engine.bind(chord("qd"), 2u32);
            engine.bind(chord("a"), 3u32);
            engine.bind(chord("h"), 4u32);
            engine.organize();
            let mut keys = ScriptedKeys::new(script);
            commands(&read_all(&mut engine, &mut keys))
        };
        assert_eq!(run(), run());
        assert_eq!(run(), vec![1, 3, 4, 2]);
    }

    #[test]
    fn test_empty_table_passes_raw_keys() {
        let mut engine: InputEngine<u32> = InputEngine::new();
        let mut keys = ScriptedKeys::new("ab");
        assert!(matches!(engine.read_key(&mut keys), KeyOutcome::Literal(_)));
        assert!(matches!(engine.read_key(&mut keys), KeyOutcome::Literal(_)));
    }

    #[test]
    fn test_macro_replays_all_but_last_key() {
        let mut engine = InputEngine::new();
        engine.bind(chord("m"), 9u32); // pretend: the execute-macro bind
        engine.organize();

        // Record "abc" then the trigger key "m".
        engine.record_macro();
        let mut keys = ScriptedKeys::new("abcm");
        let mut seen = Vec::new();
        for _ in 0..4 {
            match engine.read_key(&mut keys) {
                KeyOutcome::Literal(u) => seen.push(u.to_char()),
                KeyOutcome::Command(_) => engine.stop_recording(),
                KeyOutcome::Pending => {}
            }
        }
        assert_eq!(seen, vec!['a', 'b', 'c']);

        // Replay: tape is "abcm"; the final "m" must not replay.
        engine.execute_macro();
        let mut live = ScriptedKeys::new("z");
        let mut replayed = Vec::new();
        loop {
            match engine.read_key(&mut live) {
                KeyOutcome::Literal(u) => {
                    replayed.push(u.to_char());
                    if u.codepoint == 'z' as u32 {
                        break;
                    }
                }
                _ => {}
            }
        }
        // The macro replays a, b, c; the next read falls back to live input.
        assert_eq!(replayed, vec!['a', 'b', 'c', 'z']);
    }

    #[test]
    fn test_chord_overflow_resets() {
        let mut engine = InputEngine::new();
        // One long bind so every prefix stays Pending.
        let long: String = "x".repeat(MAX_CHORD_LEN + 2);
        engine.bind(chord(&long), 1u32);
        engine.organize();

        let mut keys = ScriptedKeys::new(&"x".repeat(MAX_CHORD_LEN + 2));
        let outcomes = read_all(&mut engine, &mut keys);
        // The chord reset at MAX_CHORD_LEN, so the bind can never complete.
        assert!(commands(&outcomes).is_empty());
    }
}
