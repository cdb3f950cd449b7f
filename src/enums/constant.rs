// 닉네임 최대 길이 (문자 수 기준)
pub const LIMIT_MAX_NICKNAME_LEN: usize = 24;

pub const DEFAULT_NICKNAME: &str = "Anonymouse";

pub const DEBUG_SESSION_ID: &str = "0xDEADBEEF";

// 프롬프트 투표에 올라가는 후보 수
pub const PROMPT_CHOICES: usize = 3;

// 로비를 벗어나기 위한 최소 인원
pub const MIN_PLAYERS: usize = 2;

pub const CONTINUE_OPTION: &str = "continue";

pub const AVAILABLE_PROMPTS: &[&str] = &[
    "a vampire who is afraid of garlic bread",
    "a kangaroo making a clever use of its pouch",
    "a princess breaking the stereotype",
    "a t-rex trying to paint its toe nails",
    "a viking tripping over his beard",
    "a cat running a very serious board meeting",
    "a snowman on a summer vacation",
];

pub const ALL_BACKDROP_ITEMS: &[&str] = &[
    "canvas",
    "parchment",
    "brick-wall",
    "chalkboard",
    "napkin",
];

pub const TEXT_ANNOUNCE_YOU_ARE_PAINTER: &str = "You are the painter!";
pub const TEXT_ANNOUNCE_YOU_ARE_TROLL: &str = "You are a troll!";
pub const TEXT_ANNOUNCE_RATING: &str = "Vote for the winner now!";
pub const TEXT_ANNOUNCE_WINNER: &str = "And the winner is...";

pub const TEXT_VOTE_PROMPT: &str = "What should be painted?";
pub const TEXT_VOTE_EFFECT: &str = "Choose an effect!";
pub const TEXT_VOTE_SHOWCASE: &str = "Look at this masterpiece!";
pub const TEXT_VOTE_RATING: &str = "How good is it?";

pub const TEXT_ERROR_NICK_EMPTY: &str = "Please enter a nickname.";
pub const TEXT_ERROR_NICK_TOO_LONG: &str = "Your nickname is too long.";
pub const TEXT_ERROR_SESSION_EMPTY: &str = "Please enter a session id.";
pub const TEXT_ERROR_BAD_SESSION: &str = "This session does not exist.";
pub const TEXT_ERROR_SESSION_RUNNING: &str = "Session is already running.";

pub const TEXT_POPUP_ALREADY_VOTED: &str = "You already voted.";
pub const TEXT_POPUP_INVALID_OPTION: &str = "That is not a valid option.";
pub const TEXT_POPUP_NOT_YOUR_TURN: &str = "It is not your turn.";
pub const TEXT_KICKED_SLOW: &str = "Your connection is too slow.";
