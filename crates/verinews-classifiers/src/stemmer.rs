//! Porter suffix-stripping stemmer
//!
//! Implements the five steps of Porter (1980) for lowercase ASCII words:
//! 1. Plurals and -ed/-ing suffixes, terminal y → i
//! 2. Double suffixes (-ational → -ate, -ization → -ize, ...)
//! 3. -icate → -ic, -ative → "", -ness → "", ...
//! 4. Single suffixes (-al, -ance, -ement, -ion, ...) when m > 1
//! 5. Final -e and -ll tidy-up
//!
//! Input is expected to be lowercase ASCII letters, which is what the
//! normalizer produces. Other bytes are treated as consonants.

/// Porter stemmer for English
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

const STEP2_RULES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("abli", "able"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
];

const STEP3_RULES: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

const STEP4_SUFFIXES: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

impl PorterStemmer {
    /// Create a new Porter stemmer
    pub fn new() -> Self {
        Self
    }

    /// Stem a single lowercase word
    pub fn stem(&self, word: &str) -> String {
        if word.len() <= 2 || !word.is_ascii() {
            return word.to_string();
        }

        let mut w = word.as_bytes().to_vec();
        step1a(&mut w);
        step1b(&mut w);
        step1c(&mut w);
        step2(&mut w);
        step3(&mut w);
        step4(&mut w);
        step5(&mut w);

        // Only ASCII bytes are ever written back
        String::from_utf8(w).unwrap_or_else(|_| word.to_string())
    }
}

fn is_consonant(w: &[u8], i: usize) -> bool {
    match w[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(w, i - 1),
        _ => true,
    }
}

/// Number of vowel-consonant sequences, the `m` in `[C](VC)^m[V]`
fn measure(w: &[u8]) -> usize {
    let n = w.len();
    let mut i = 0;
    while i < n && is_consonant(w, i) {
        i += 1;
    }

    let mut m = 0;
    loop {
        while i < n && !is_consonant(w, i) {
            i += 1;
        }
        if i >= n {
            return m;
        }
        m += 1;
        while i < n && is_consonant(w, i) {
            i += 1;
        }
    }
}

fn has_vowel(w: &[u8]) -> bool {
    (0..w.len()).any(|i| !is_consonant(w, i))
}

fn ends_double_consonant(w: &[u8]) -> bool {
    let n = w.len();
    n >= 2 && w[n - 1] == w[n - 2] && is_consonant(w, n - 1)
}

/// Consonant-vowel-consonant ending where the last consonant is not w, x or y
fn ends_cvc(w: &[u8]) -> bool {
    let n = w.len();
    n >= 3
        && is_consonant(w, n - 3)
        && !is_consonant(w, n - 2)
        && is_consonant(w, n - 1)
        && !matches!(w[n - 1], b'w' | b'x' | b'y')
}

fn ends_with(w: &[u8], suffix: &str) -> bool {
    w.ends_with(suffix.as_bytes())
}

fn stem_len(w: &[u8], suffix: &str) -> usize {
    w.len() - suffix.len()
}

fn replace_suffix(w: &mut Vec<u8>, suffix: &str, replacement: &str) {
    let keep = stem_len(w, suffix);
    w.truncate(keep);
    w.extend_from_slice(replacement.as_bytes());
}

fn step1a(w: &mut Vec<u8>) {
    if ends_with(w, "sses") {
        replace_suffix(w, "sses", "ss");
    } else if ends_with(w, "ies") {
        replace_suffix(w, "ies", "i");
    } else if ends_with(w, "ss") {
        // unchanged
    } else if ends_with(w, "s") {
        w.pop();
    }
}

fn step1b(w: &mut Vec<u8>) {
    if ends_with(w, "eed") {
        if measure(&w[..stem_len(w, "eed")]) > 0 {
            w.pop();
        }
        return;
    }

    let stripped = if ends_with(w, "ed") && has_vowel(&w[..stem_len(w, "ed")]) {
        replace_suffix(w, "ed", "");
        true
    } else if ends_with(w, "ing") && has_vowel(&w[..stem_len(w, "ing")]) {
        replace_suffix(w, "ing", "");
        true
    } else {
        false
    };

    if !stripped {
        return;
    }

    if ends_with(w, "at") || ends_with(w, "bl") || ends_with(w, "iz") {
        w.push(b'e');
    } else if ends_double_consonant(w) && !matches!(w[w.len() - 1], b'l' | b's' | b'z') {
        w.pop();
    } else if measure(w) == 1 && ends_cvc(w) {
        w.push(b'e');
    }
}

fn step1c(w: &mut Vec<u8>) {
    if ends_with(w, "y") && has_vowel(&w[..w.len() - 1]) {
        let last = w.len() - 1;
        w[last] = b'i';
    }
}

/// Apply the first rule whose suffix matches, if the stem has m > 0
fn apply_rules(w: &mut Vec<u8>, rules: &[(&str, &str)]) {
    if let Some((suffix, replacement)) = rules.iter().find(|(suffix, _)| ends_with(w, suffix)) {
        if measure(&w[..stem_len(w, suffix)]) > 0 {
            replace_suffix(w, suffix, replacement);
        }
    }
}

fn step2(w: &mut Vec<u8>) {
    apply_rules(w, STEP2_RULES);
}

fn step3(w: &mut Vec<u8>) {
    apply_rules(w, STEP3_RULES);
}

fn step4(w: &mut Vec<u8>) {
    for suffix in STEP4_SUFFIXES {
        if !ends_with(w, suffix) {
            continue;
        }
        let keep = stem_len(w, suffix);
        if *suffix == "ion" && !(keep > 0 && matches!(w[keep - 1], b's' | b't')) {
            continue;
        }
        if measure(&w[..keep]) > 1 {
            w.truncate(keep);
        }
        return;
    }
}

fn step5(w: &mut Vec<u8>) {
    if ends_with(w, "e") {
        let stem = &w[..w.len() - 1];
        let m = measure(stem);
        if m > 1 || (m == 1 && !ends_cvc(stem)) {
            w.pop();
        }
    }

    if ends_with(w, "ll") && measure(w) > 1 {
        w.pop();
    }
}
