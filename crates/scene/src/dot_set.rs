use foundation::DotId;

/// Set of dots backed by a bitset, sized once for the dot array.
///
/// The lift pass records every dot it moved here so the geometry sync can ask
/// "did this hotspot's dot move?" in O(1) without rescanning lifts.
///
/// Iteration yields ids in ascending index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotSet {
    words: Vec<u64>,
    len: usize,
}

impl DotSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(dot_count: usize) -> Self {
        Self {
            words: vec![0; dot_count.div_ceil(64)],
            len: 0,
        }
    }

    /// Empties the set without releasing its storage.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, dot: DotId) -> bool {
        let (word, bit) = word_bit(dot);
        self.words
            .get(word)
            .is_some_and(|w| (w & (1u64 << bit)) != 0)
    }

    /// Inserts `dot`. Returns `true` if the set changed.
    pub fn insert(&mut self, dot: DotId) -> bool {
        let (word, bit) = word_bit(dot);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        let mask = 1u64 << bit;
        let w = &mut self.words[word];
        if (*w & mask) != 0 {
            return false;
        }
        *w |= mask;
        self.len += 1;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = DotId> + '_ {
        DotSetIter {
            words: &self.words,
            word_index: 0,
            current_word: 0,
            base_index: 0,
        }
    }
}

fn word_bit(dot: DotId) -> (usize, u32) {
    let index = dot.index();
    ((index / 64) as usize, index % 64)
}

struct DotSetIter<'a> {
    words: &'a [u64],
    word_index: usize,
    current_word: u64,
    base_index: u32,
}

impl Iterator for DotSetIter<'_> {
    type Item = DotId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let tz = self.current_word.trailing_zeros();
                self.current_word &= !(1u64 << tz);
                return Some(DotId::new(self.base_index + tz));
            }

            let w = *self.words.get(self.word_index)?;
            self.current_word = w;
            self.base_index = (self.word_index as u32) * 64;
            self.word_index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DotSet;
    use foundation::DotId;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_contains_and_len() {
        let mut s = DotSet::with_capacity(10);
        assert!(s.is_empty());
        assert!(s.insert(DotId::new(3)));
        assert!(!s.insert(DotId::new(3)));
        assert!(s.contains(DotId::new(3)));
        assert!(!s.contains(DotId::new(4)));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut s = DotSet::with_capacity(1);
        assert!(s.insert(DotId::new(200)));
        assert!(s.contains(DotId::new(200)));
    }

    #[test]
    fn clear_keeps_storage_and_empties() {
        let mut s = DotSet::with_capacity(128);
        s.insert(DotId::new(1));
        s.insert(DotId::new(127));
        s.clear();
        assert!(s.is_empty());
        assert!(!s.contains(DotId::new(127)));
    }

    #[test]
    fn iter_is_sorted() {
        let mut s = DotSet::new();
        s.insert(DotId::new(65));
        s.insert(DotId::new(2));
        s.insert(DotId::new(10));
        let got: Vec<u32> = s.iter().map(DotId::index).collect();
        assert_eq!(got, vec![2, 10, 65]);
    }
}
