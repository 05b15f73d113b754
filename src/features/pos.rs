//! Penn Treebank part-of-speech tags as used in extracted-features data.

use std::fmt;

/// A Penn Treebank part-of-speech tag.
///
/// Extracted-features token counts key on these codes, though the data
/// also contains ad-hoc codes outside the tag set; [`from_code`]
/// (Self::from_code) therefore returns `Option` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    CoordinatingConjunction,
    CardinalNumber,
    Determiner,
    ExistentialThere,
    ForeignWord,
    Preposition,
    Adjective,
    AdjectiveComparative,
    AdjectiveSuperlative,
    ListItemMarker,
    Modal,
    Noun,
    NounPlural,
    ProperNoun,
    ProperNounPlural,
    Predeterminer,
    PossessiveEnding,
    PersonalPronoun,
    PossessivePronoun,
    Adverb,
    AdverbComparative,
    AdverbSuperlative,
    Particle,
    Symbol,
    To,
    Interjection,
    Verb,
    VerbPastTense,
    VerbGerund,
    VerbPastParticiple,
    VerbNonThirdSingular,
    VerbThirdSingular,
    WhDeterminer,
    WhPronoun,
    PossessiveWhPronoun,
    WhAdverb,
}

impl PartOfSpeech {
    pub const ALL: [PartOfSpeech; 36] = [
        PartOfSpeech::CoordinatingConjunction,
        PartOfSpeech::CardinalNumber,
        PartOfSpeech::Determiner,
        PartOfSpeech::ExistentialThere,
        PartOfSpeech::ForeignWord,
        PartOfSpeech::Preposition,
        PartOfSpeech::Adjective,
        PartOfSpeech::AdjectiveComparative,
        PartOfSpeech::AdjectiveSuperlative,
        PartOfSpeech::ListItemMarker,
        PartOfSpeech::Modal,
        PartOfSpeech::Noun,
        PartOfSpeech::NounPlural,
        PartOfSpeech::ProperNoun,
        PartOfSpeech::ProperNounPlural,
        PartOfSpeech::Predeterminer,
        PartOfSpeech::PossessiveEnding,
        PartOfSpeech::PersonalPronoun,
        PartOfSpeech::PossessivePronoun,
        PartOfSpeech::Adverb,
        PartOfSpeech::AdverbComparative,
        PartOfSpeech::AdverbSuperlative,
        PartOfSpeech::Particle,
        PartOfSpeech::Symbol,
        PartOfSpeech::To,
        PartOfSpeech::Interjection,
        PartOfSpeech::Verb,
        PartOfSpeech::VerbPastTense,
        PartOfSpeech::VerbGerund,
        PartOfSpeech::VerbPastParticiple,
        PartOfSpeech::VerbNonThirdSingular,
        PartOfSpeech::VerbThirdSingular,
        PartOfSpeech::WhDeterminer,
        PartOfSpeech::WhPronoun,
        PartOfSpeech::PossessiveWhPronoun,
        PartOfSpeech::WhAdverb,
    ];

    /// The tag code as it appears in `tokenPosCount` keys.
    pub fn code(self) -> &'static str {
        match self {
            PartOfSpeech::CoordinatingConjunction => "CC",
            PartOfSpeech::CardinalNumber => "CD",
            PartOfSpeech::Determiner => "DT",
            PartOfSpeech::ExistentialThere => "EX",
            PartOfSpeech::ForeignWord => "FW",
            PartOfSpeech::Preposition => "IN",
            PartOfSpeech::Adjective => "JJ",
            PartOfSpeech::AdjectiveComparative => "JJR",
            PartOfSpeech::AdjectiveSuperlative => "JJS",
            PartOfSpeech::ListItemMarker => "LS",
            PartOfSpeech::Modal => "MD",
            PartOfSpeech::Noun => "NN",
            PartOfSpeech::NounPlural => "NNS",
            PartOfSpeech::ProperNoun => "NNP",
            PartOfSpeech::ProperNounPlural => "NNPS",
            PartOfSpeech::Predeterminer => "PDT",
            PartOfSpeech::PossessiveEnding => "POS",
            PartOfSpeech::PersonalPronoun => "PRP",
            PartOfSpeech::PossessivePronoun => "PRP$",
            PartOfSpeech::Adverb => "RB",
            PartOfSpeech::AdverbComparative => "RBR",
            PartOfSpeech::AdverbSuperlative => "RBS",
            PartOfSpeech::Particle => "RP",
            PartOfSpeech::Symbol => "SYM",
            PartOfSpeech::To => "TO",
            PartOfSpeech::Interjection => "UH",
            PartOfSpeech::Verb => "VB",
            PartOfSpeech::VerbPastTense => "VBD",
            PartOfSpeech::VerbGerund => "VBG",
            PartOfSpeech::VerbPastParticiple => "VBN",
            PartOfSpeech::VerbNonThirdSingular => "VBP",
            PartOfSpeech::VerbThirdSingular => "VBZ",
            PartOfSpeech::WhDeterminer => "WDT",
            PartOfSpeech::WhPronoun => "WP",
            PartOfSpeech::PossessiveWhPronoun => "WP$",
            PartOfSpeech::WhAdverb => "WRB",
        }
    }

    /// Human-readable tag name.
    pub fn description(self) -> &'static str {
        match self {
            PartOfSpeech::CoordinatingConjunction => "Coordinating conjunction",
            PartOfSpeech::CardinalNumber => "Cardinal number",
            PartOfSpeech::Determiner => "Determiner",
            PartOfSpeech::ExistentialThere => "Existential 'there'",
            PartOfSpeech::ForeignWord => "Foreign word",
            PartOfSpeech::Preposition => "Preposition or subordinating conjunction",
            PartOfSpeech::Adjective => "Adjective",
            PartOfSpeech::AdjectiveComparative => "Adjective, comparative",
            PartOfSpeech::AdjectiveSuperlative => "Adjective, superlative",
            PartOfSpeech::ListItemMarker => "List item marker",
            PartOfSpeech::Modal => "Modal",
            PartOfSpeech::Noun => "Noun, singular or mass",
            PartOfSpeech::NounPlural => "Noun, plural",
            PartOfSpeech::ProperNoun => "Proper noun, singular",
            PartOfSpeech::ProperNounPlural => "Proper noun, plural",
            PartOfSpeech::Predeterminer => "Predeterminer",
            PartOfSpeech::PossessiveEnding => "Possessive ending",
            PartOfSpeech::PersonalPronoun => "Personal pronoun",
            PartOfSpeech::PossessivePronoun => "Possessive pronoun",
            PartOfSpeech::Adverb => "Adverb",
            PartOfSpeech::AdverbComparative => "Adverb, comparative",
            PartOfSpeech::AdverbSuperlative => "Adverb, superlative",
            PartOfSpeech::Particle => "Particle",
            PartOfSpeech::Symbol => "Symbol",
            PartOfSpeech::To => "'to'",
            PartOfSpeech::Interjection => "Interjection",
            PartOfSpeech::Verb => "Verb, base form",
            PartOfSpeech::VerbPastTense => "Verb, past tense",
            PartOfSpeech::VerbGerund => "Verb, gerund or present participle",
            PartOfSpeech::VerbPastParticiple => "Verb, past participle",
            PartOfSpeech::VerbNonThirdSingular => "Verb, non-3rd person singular present",
            PartOfSpeech::VerbThirdSingular => "Verb, 3rd person singular present",
            PartOfSpeech::WhDeterminer => "Wh-determiner",
            PartOfSpeech::WhPronoun => "Wh-pronoun",
            PartOfSpeech::PossessiveWhPronoun => "Possessive wh-pronoun",
            PartOfSpeech::WhAdverb => "Wh-adverb",
        }
    }

    /// Looks up a tag by its code. Returns `None` for codes outside the
    /// Penn Treebank set.
    pub fn from_code(code: &str) -> Option<PartOfSpeech> {
        Self::ALL.iter().copied().find(|pos| pos.code() == code)
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
