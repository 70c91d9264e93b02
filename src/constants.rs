//! Pipeline defaults and the tokenizer stop-word list.

/// Minimum cosine similarity for a message to join an existing topic.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Maximum number of keywords kept per topic.
pub const DEFAULT_MAX_TOPIC_KEYWORDS: usize = 5;

/// Cache entry time-to-live, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Maximum attempts for a store operation before the pass fails retriably.
pub const DEFAULT_MAX_STORE_RETRIES: u32 = 3;

/// Linear backoff step between store retries, in milliseconds.
pub const RETRY_BACKOFF_BASE_MS: u64 = 100;

/// Assignment worker threads consuming the ingestion queue.
pub const DEFAULT_QUEUE_WORKERS: usize = 4;

/// Maximum buffered assignment jobs. A full queue drops the job with a
/// warning; the message stays unassigned for the retry sweep.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Maximum message length accepted at ingestion.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Tokens shorter than this are dropped before vectorization.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Default limit for the recent-messages read path.
pub const DEFAULT_RECENT_MESSAGES_LIMIT: usize = 50;

/// English stop words removed before TF-IDF vectorization (SMART-list
/// derived). Must stay lowercase and alphabetically sorted.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost",
    "along", "already", "also", "although", "always", "am", "among", "an",
    "and", "another", "any", "anybody", "anyhow", "anyone", "anything",
    "anyway", "anywhere", "are", "around", "as", "at", "back", "be",
    "became", "because", "become", "becomes", "been", "before", "behind",
    "being", "below", "beside", "besides", "between", "beyond", "both",
    "but", "by", "came", "can", "cannot", "come", "could", "did", "do",
    "does", "doing", "done", "down", "during", "each", "either", "else",
    "enough", "etc", "even", "ever", "every", "everybody", "everyone",
    "everything", "everywhere", "few", "for", "from", "further", "get",
    "gets", "getting", "give", "given", "gives", "go", "goes", "going",
    "gone", "got", "had", "has", "have", "having", "he", "hello", "help",
    "hence", "her", "here", "hers", "herself", "him", "himself", "his",
    "how", "however", "if", "in", "indeed", "instead", "into", "is", "it",
    "its", "itself", "just", "keep", "keeps", "kept", "know", "known",
    "knows", "last", "least", "less", "let", "lets", "like", "liked",
    "likely", "little", "look", "looking", "looks", "made", "make",
    "makes", "many", "may", "maybe", "me", "might", "mine", "more",
    "moreover", "most", "mostly", "much", "must", "my", "myself",
    "namely", "near", "nearly", "need", "needed", "needs", "neither",
    "never", "nevertheless", "new", "next", "no", "nobody", "none",
    "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off",
    "often", "on", "once", "one", "only", "onto", "or", "other", "others",
    "otherwise", "our", "ours", "ourselves", "out", "over", "own", "per",
    "perhaps", "please", "put", "quite", "rather", "really", "said",
    "same", "say", "saying", "says", "see", "seem", "seemed", "seeming",
    "seems", "seen", "several", "shall", "she", "should", "since", "so",
    "some", "somebody", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "take", "taken", "than",
    "that", "the", "their", "theirs", "them", "themselves", "then",
    "thence", "there", "thereafter", "thereby", "therefore", "these",
    "they", "thing", "things", "this", "those", "though", "through",
    "throughout", "thus", "to", "together", "too", "toward", "towards",
    "under", "until", "up", "upon", "us", "use", "used", "uses", "using",
    "various", "very", "via", "want", "wants", "was", "way", "we", "well",
    "went", "were", "what", "whatever", "when", "whence", "whenever",
    "where", "whereafter", "whereas", "whereby", "wherein", "whereupon",
    "wherever", "whether", "which", "while", "whither", "who", "whoever",
    "whole", "whom", "whose", "why", "will", "with", "within", "without",
    "would", "yes", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];
