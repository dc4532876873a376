//! Prompt and fallback pools.

/// System instruction sent with every request.
pub const SYSTEM_PROMPT: &str = "You are a dating coach specializing in creative date ideas. \
Provide a short, creative, and engaging dating suggestion. \
Keep it concise (maximum 2 sentences), romantic, and practical.";

/// User instructions. The first entry is the single-variant prompt.
pub const USER_PROMPTS: &[&str] = &[
    "Give me a fresh dating suggestion quote.",
    "Suggest a cozy date idea for a rainy evening.",
    "Share a budget-friendly date idea that still feels special.",
    "Give me an outdoor date suggestion for a sunny weekend.",
    "Suggest a creative at-home date night.",
    "Recommend a date idea that helps a couple try something new together.",
    "Give me a romantic date idea for a long-term couple.",
    "Suggest a playful first-date activity that breaks the ice.",
];

/// Substituted when generation fails. The first entry is the single-variant
/// fallback.
pub const FALLBACK_QUOTES: &[&str] = &[
    "Try a sunset picnic with your favorite foods and a great view - simple but memorable.",
    "Cook a new recipe together tonight, then eat by candlelight with your phones in another room.",
    "Visit a local bookstore, pick a book for each other, and swap them over coffee.",
    "Take a sunrise walk to a spot you have never explored and bring something warm to drink.",
    "Build a blanket fort, queue up the movie from your first date, and make popcorn from scratch.",
    "Go stargazing somewhere dark, and take turns naming your own constellations.",
    "Plan a mini tasting tour of three nearby cafes and crown a winner together.",
    "Write each other a short letter, seal it, and read them aloud over dessert.",
];
