use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
    static ref ENGLISH: BTreeSet<String> = {
        let words: &[&str] = &[
            "a","about","above","across","after","afterwards","again","against","all","almost","alone","along","already","also","although","always","am","among","amongst","amoungst","amount","an","and","another","any","anyhow","anyone","anything","anyway","anywhere","are","around","as","at",
            "back","be","became","because","become","becomes","becoming","been","before","beforehand","behind","being","below","beside","besides","between","beyond","bill","both","bottom","but","by",
            "call","can","cannot","cant","co","con","could","couldnt","cry",
            "de","describe","detail","do","done","down","due","during",
            "each","eg","eight","either","eleven","else","elsewhere","empty","enough","etc","even","ever","every","everyone","everything","everywhere","except",
            "few","fifteen","fifty","fill","find","fire","first","five","for","former","formerly","forty","found","four","from","front","full","further",
            "get","give","go",
            "had","has","hasnt","have","he","hence","her","here","hereafter","hereby","herein","hereupon","hers","herself","him","himself","his","how","however","hundred",
            "i","ie","if","in","inc","indeed","interest","into","is","it","its","itself",
            "keep","last","latter","latterly","least","less","ltd",
            "made","many","may","me","meanwhile","might","mill","mine","more","moreover","most","mostly","move","much","must","my","myself",
            "name","namely","neither","never","nevertheless","next","nine","no","nobody","none","noone","nor","not","nothing","now","nowhere",
            "of","off","often","on","once","one","only","onto","or","other","others","otherwise","our","ours","ourselves","out","over","own",
            "part","per","perhaps","please","put",
            "rather","re",
            "same","see","seem","seemed","seeming","seems","serious","several","she","should","show","side","since","sincere","six","sixty","so","some","somehow","someone","something","sometime","sometimes","somewhere","still","such","system",
            "take","ten","than","that","the","their","them","themselves","then","thence","there","thereafter","thereby","therefore","therein","thereupon","these","they","thick","thin","third","this","those","though","three","through","throughout","thru","thus","to","together","too","top","toward","towards","twelve","twenty","two",
            "un","under","until","up","upon","us",
            "very","via",
            "was","we","well","were","what","whatever","when","whence","whenever","where","whereafter","whereas","whereby","wherein","whereupon","wherever","whether","which","while","whither","who","whoever","whole","whom","whose","why","will","with","within","without","would",
            "yet","you","your","yours","yourself","yourselves"
        ];
        words.iter().map(|w| w.to_string()).collect()
    };
}

/// Set of lower-cased words removed before a token reaches the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopWords {
    words: BTreeSet<String>,
}

impl StopWords {
    /// The common English list shipped with most bag-of-words vectorizers.
    pub fn english() -> Self {
        Self { words: ENGLISH.clone() }
    }

    pub fn none() -> Self {
        Self { words: BTreeSet::new() }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { words: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect() }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::english()
    }
}

/// Splits text into lower-cased terms. Building and query encoding must share one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenizer {
    stop_words: StopWords,
    min_token_len: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self { stop_words: StopWords::english(), min_token_len: 2 }
    }
}

impl Tokenizer {
    pub fn new(stop_words: StopWords, min_token_len: usize) -> Self {
        Self { stop_words, min_token_len }
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    pub fn min_token_len(&self) -> usize {
        self.min_token_len
    }

    /// Tokenize text using NFKC normalization, lowercase, alphanumeric runs and stopword removal.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        RE.find_iter(&normalized)
            .map(|m| m.as_str())
            .filter(|t| t.chars().count() >= self.min_token_len)
            .filter(|t| !self.stop_words.contains(t))
            .map(str::to_string)
            .collect()
    }
}

/// Tokenize with the default English configuration.
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::default().tokenize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Python for Beginners: Programming!");
        assert_eq!(t, vec!["python", "beginners", "programming"]);
    }

    #[test]
    fn splits_on_punctuation_and_drops_short_tokens() {
        let t = tokenize("C++/Rust-101 & a b");
        assert_eq!(t, vec!["rust", "101"]);
    }

    #[test]
    fn custom_stop_words_replace_english() {
        let tok = Tokenizer::new(StopWords::from_words(["Python"]), 1);
        assert_eq!(tok.tokenize("The Python C"), vec!["the", "c"]);
    }

    #[test]
    fn english_list_is_complete() {
        assert_eq!(StopWords::english().len(), 318);
    }
}
