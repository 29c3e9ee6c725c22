//! Full-text search: text analysis and relevance ranking.
//!
//! A deployment searches in exactly one [`SearchLanguage`]. Documents and
//! queries go through the same [`TextAnalyzer`]: split into words, lowercased,
//! stop words removed, Snowball-stemmed. A post matches when every query
//! lexeme occurs in its title or content, mirroring PostgreSQL's
//! `plainto_tsquery` semantics.

use std::fmt;
use std::str::FromStr;

use rust_stemmers::{Algorithm, Stemmer};
use serde::Serialize;

use crate::domain::Post;

/// The natural-language configuration used for stemming and stop words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchLanguage {
    #[default]
    English,
    Russian,
    /// No stemming and no stop words.
    Simple,
}

impl SearchLanguage {
    /// Name of the matching PostgreSQL text search configuration.
    pub fn regconfig(&self) -> &'static str {
        match self {
            SearchLanguage::English => "english",
            SearchLanguage::Russian => "russian",
            SearchLanguage::Simple => "simple",
        }
    }

    fn algorithm(&self) -> Option<Algorithm> {
        match self {
            SearchLanguage::English => Some(Algorithm::English),
            SearchLanguage::Russian => Some(Algorithm::Russian),
            SearchLanguage::Simple => None,
        }
    }

    fn stop_words(&self) -> &'static [&'static str] {
        match self {
            SearchLanguage::English => ENGLISH_STOP_WORDS,
            SearchLanguage::Russian => RUSSIAN_STOP_WORDS,
            SearchLanguage::Simple => &[],
        }
    }
}

impl fmt::Display for SearchLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.regconfig())
    }
}

impl FromStr for SearchLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(SearchLanguage::English),
            "russian" | "ru" => Ok(SearchLanguage::Russian),
            "simple" => Ok(SearchLanguage::Simple),
            other => Err(format!("unsupported search language: {other}")),
        }
    }
}

/// Turns text into normalized lexemes for one language.
pub struct TextAnalyzer {
    language: SearchLanguage,
    stemmer: Option<Stemmer>,
}

impl TextAnalyzer {
    pub fn new(language: SearchLanguage) -> Self {
        Self {
            language,
            stemmer: language.algorithm().map(Stemmer::create),
        }
    }

    /// Lexemes of `text` in order of appearance, duplicates kept.
    pub fn lexemes(&self, text: &str) -> Vec<String> {
        let stop_words = self.language.stop_words();

        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .filter(|word| !stop_words.contains(&word.as_str()))
            .map(|word| match &self.stemmer {
                Some(stemmer) => stemmer.stem(&word).into_owned(),
                None => word,
            })
            .collect()
    }
}

impl fmt::Debug for TextAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextAnalyzer")
            .field("language", &self.language)
            .finish()
    }
}

/// A parsed search query: the distinct lexemes every match must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<String>,
}

impl SearchQuery {
    /// Returns `None` when the input has no searchable lexemes, i.e. it is
    /// blank or made only of stop words.
    pub fn parse(analyzer: &TextAnalyzer, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let mut terms: Vec<String> = Vec::new();
        for lexeme in analyzer.lexemes(raw) {
            if !terms.contains(&lexeme) {
                terms.push(lexeme);
            }
        }

        if terms.is_empty() {
            return None;
        }

        Some(Self { terms })
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Relevance of `document`: summed term frequency of the query lexemes,
    /// normalized by document length. Zero unless every lexeme is present.
    pub fn score(&self, analyzer: &TextAnalyzer, document: &str) -> f32 {
        let lexemes = analyzer.lexemes(document);
        if lexemes.is_empty() {
            return 0.0;
        }

        let mut hits = 0usize;
        for term in &self.terms {
            let tf = lexemes.iter().filter(|l| *l == term).count();
            if tf == 0 {
                return 0.0;
            }
            hits += tf;
        }

        hits as f32 / lexemes.len() as f32
    }
}

/// A post matching a search, with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub post: Post,
    pub rank: f32,
}

/// Score every post against `query`, drop non-matches and order by
/// descending rank (newer post first on equal rank).
pub fn rank_matches<I>(analyzer: &TextAnalyzer, query: &SearchQuery, posts: I) -> Vec<SearchHit>
where
    I: IntoIterator<Item = Post>,
{
    let mut hits: Vec<SearchHit> = posts
        .into_iter()
        .filter_map(|post| {
            let rank = query.score(analyzer, &post.searchable_text());
            (rank > 0.0).then_some(SearchHit { post, rank })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.rank
            .total_cmp(&a.rank)
            .then_with(|| b.post.created_at.cmp(&a.post.created_at))
    });
    hits
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "s", "same", "she", "should",
    "so", "some", "such", "t", "than", "that", "the", "their", "theirs", "them", "themselves",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "you", "your", "yours", "yourself", "yourselves",
];

const RUSSIAN_STOP_WORDS: &[&str] = &[
    "и", "в", "во", "не", "что", "он", "на", "я", "с", "со", "как", "а", "то", "все", "она",
    "так", "его", "но", "да", "ты", "к", "у", "же", "вы", "за", "бы", "по", "только", "ее",
    "мне", "было", "вот", "от", "меня", "еще", "нет", "о", "из", "ему", "теперь", "когда",
    "даже", "ну", "вдруг", "ли", "если", "уже", "или", "ни", "быть", "был", "него", "до", "вас",
    "нибудь", "опять", "уж", "вам", "ведь", "там", "потом", "себя", "ничего", "ей", "может",
    "они", "тут", "где", "есть", "надо", "ней", "для", "мы", "тебя", "их", "чем", "была", "сам",
    "чтоб", "без", "будто", "чего", "раз", "тоже", "себе", "под", "будет", "ж", "тогда", "кто",
    "этот", "это", "эта", "эти",
];
