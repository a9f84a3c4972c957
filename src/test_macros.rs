use crate::document::DocumentSet;
use crate::group::{PrimeGroup, SAFE_PRIME_64};
use num_bigint::BigUint;

pub fn fruit_corpus() -> DocumentSet {
    [
        ("doc1", "apple banana cherry"),
        ("doc2", "banana cherry date"),
        ("doc3", "apple cherry elderberry"),
        ("doc4", "banana apple fig"),
        ("doc5", "grape apple banana"),
    ]
    .into_iter()
    .collect()
}

/// [`fruit_corpus`] plus a document that only shares a prefix with "apple".
pub fn substring_corpus() -> DocumentSet {
    let mut documents = fruit_corpus();
    documents.push(crate::document::Document::new(
        "doc6",
        "appliance repair guide",
    ));

    documents
}

pub fn small_group() -> PrimeGroup {
    PrimeGroup::new(BigUint::from(SAFE_PRIME_64)).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub fn sorted(mut ids: Vec<String>) -> Vec<String> {
    ids.sort();
    ids
}

macro_rules! test_oxt {
    ($name: ident, $group: expr, $params: expr) => {
        mod $name {
            use crate::document::{Tokenizer, WordTokenizer};
            use crate::index::EncryptedIndex;
            use crate::keys::KeyMaterial;
            use crate::oxt::Oxt;
            use crate::test_macros::{fruit_corpus, init_tracing, sorted};
            use crate::{Compress, SearchScheme};

            #[allow(unused_imports)]
            use super::*;

            fn perform_default() -> (Oxt, KeyMaterial, EncryptedIndex) {
                init_tracing();

                let mut rng = rand::thread_rng();
                let oxt = Oxt::new($group, $params).unwrap();
                let (keys, index) = oxt.setup(&fruit_corpus(), &mut rng).unwrap();

                (oxt, keys, index)
            }

            #[test]
            fn single_keyword_is_complete() {
                let (oxt, keys, index) = perform_default();
                let metadata = fruit_corpus().metadata(&WordTokenizer);

                assert_eq!(index.keyword_count(), metadata.len());
                for (w, ids) in metadata.iter() {
                    let found = sorted(oxt.search(&keys, &index, &[w.as_str()]).unwrap());
                    let expected: Vec<String> = ids.iter().cloned().collect();

                    assert_eq!(found, expected, "keyword {}", w);
                }
            }

            #[test]
            fn three_keywords() {
                let (oxt, keys, index) = perform_default();

                for query in [
                    ["apple", "banana", "cherry"],
                    ["cherry", "banana", "apple"],
                    ["banana", "cherry", "apple"],
                ] {
                    assert_eq!(oxt.search(&keys, &index, &query).unwrap(), vec!["doc1"]);
                }
            }

            #[test]
            fn two_keywords() {
                let (oxt, keys, index) = perform_default();

                let apple_fig = oxt.search(&keys, &index, &["apple", "fig"]).unwrap();
                let fig_apple = oxt.search(&keys, &index, &["fig", "apple"]).unwrap();
                assert_eq!(apple_fig, vec!["doc4"]);
                assert_eq!(apple_fig, fig_apple);

                assert!(oxt
                    .search(&keys, &index, &["apple", "date"])
                    .unwrap()
                    .is_empty());
                assert_eq!(
                    sorted(oxt.search(&keys, &index, &["banana", "apple"]).unwrap()),
                    vec!["doc1", "doc4", "doc5"]
                );
            }

            #[test]
            fn unknown_keyword() {
                let (oxt, keys, index) = perform_default();

                let queries: [&[&str]; 3] =
                    [&["orange"], &["apple", "orange"], &["orange", "apple"]];
                for query in queries {
                    assert!(oxt.search(&keys, &index, query).unwrap().is_empty());
                }
            }

            #[test]
            fn repeated_keyword() {
                let (oxt, keys, index) = perform_default();

                assert_eq!(
                    sorted(oxt.search(&keys, &index, &["cherry", "cherry"]).unwrap()),
                    sorted(oxt.search(&keys, &index, &["cherry"]).unwrap())
                );
            }

            #[test]
            fn tokenized_queries() {
                let (oxt, keys, index) = perform_default();
                let words: Vec<String> = WordTokenizer.tokenize("Grape, Banana").into_iter().collect();
                let words: Vec<&str> = words.iter().map(String::as_str).collect();

                assert_eq!(oxt.search(&keys, &index, &words).unwrap(), vec!["doc5"]);
            }

            #[test]
            fn eq_serialize_deserialize() {
                let (oxt, keys, index) = perform_default();

                let keys2 = KeyMaterial::from_bytes(&keys.to_bytes()).unwrap();
                let index2 = EncryptedIndex::from_bytes(&index.to_bytes().unwrap()).unwrap();
                assert_eq!(keys, keys2);
                assert_eq!(index, index2);

                assert_eq!(
                    oxt.search(&keys2, &index2, &["elderberry", "apple"]).unwrap(),
                    vec!["doc3"]
                );
            }
        }
    };
}

macro_rules! test_substring {
    ($name: ident, $group: expr) => {
        mod $name {
            use crate::index::EncryptedIndex;
            use crate::oxt::OxtParams;
            use crate::substring::{SubstringConfig, SubstringKeys, SubstringOxt};
            use crate::test_macros::{init_tracing, sorted, substring_corpus};
            use crate::SearchScheme;

            #[allow(unused_imports)]
            use super::*;

            fn perform_default() -> (SubstringOxt, SubstringKeys, EncryptedIndex) {
                init_tracing();

                let mut rng = rand::thread_rng();
                let scheme =
                    SubstringOxt::new($group, OxtParams::default(), SubstringConfig::default())
                        .unwrap();
                let (keys, index) = scheme.setup(&substring_corpus(), &mut rng).unwrap();

                (scheme, keys, index)
            }

            fn search(
                scheme: &SubstringOxt,
                keys: &SubstringKeys,
                index: &EncryptedIndex,
                pattern: &str,
            ) -> Vec<String> {
                sorted(scheme.search(keys, index, pattern).unwrap())
            }

            #[test]
            fn whole_word() {
                let (scheme, keys, index) = perform_default();

                assert_eq!(
                    search(&scheme, &keys, &index, "apple"),
                    vec!["doc1", "doc3", "doc4", "doc5"]
                );
                assert_eq!(
                    search(&scheme, &keys, &index, "APPLE"),
                    search(&scheme, &keys, &index, "apple")
                );
            }

            #[test]
            fn inner_substring() {
                let (scheme, keys, index) = perform_default();

                assert_eq!(
                    search(&scheme, &keys, &index, "nan"),
                    vec!["doc1", "doc2", "doc4", "doc5"]
                );
                assert_eq!(search(&scheme, &keys, &index, "elder"), vec!["doc3"]);
            }

            #[test]
            fn prefix() {
                let (scheme, keys, index) = perform_default();

                assert_eq!(
                    search(&scheme, &keys, &index, "appl"),
                    vec!["doc1", "doc3", "doc4", "doc5", "doc6"]
                );
            }

            #[test]
            fn too_short() {
                let (scheme, keys, index) = perform_default();

                assert!(search(&scheme, &keys, &index, "ap").is_empty());
                assert!(search(&scheme, &keys, &index, "").is_empty());
            }

            #[test]
            fn absent() {
                let (scheme, keys, index) = perform_default();

                assert!(search(&scheme, &keys, &index, "xyz").is_empty());
                assert!(search(&scheme, &keys, &index, "cherry fig").is_empty());
            }

            #[test]
            fn spans_words() {
                let (scheme, keys, index) = perform_default();

                assert_eq!(
                    search(&scheme, &keys, &index, "banana cherry"),
                    vec!["doc1", "doc2"]
                );
                assert_eq!(search(&scheme, &keys, &index, "repair"), vec!["doc6"]);
            }
        }
    };
}
