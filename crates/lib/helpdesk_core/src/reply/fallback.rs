//! Static keyword-matched replies used when the completion service is not
//! available.

/// Keyword table. Order matters: the first key contained in the message wins.
pub const FALLBACK_RESPONSES: &[(&str, &str)] = &[
    (
        "return",
        "We offer a 30-day return policy. Items must be unused and in original packaging. Return shipping is free for defective items.",
    ),
    (
        "shipping",
        "We ship to USA, Canada, UK, and EU countries. Standard shipping takes 5-7 business days, Express takes 2-3 business days.",
    ),
    (
        "hours",
        "Our support hours are Monday-Friday: 9 AM - 6 PM EST, Saturday: 10 AM - 4 PM EST, Sunday: Closed.",
    ),
    (
        "price",
        "We offer competitive pricing with a price match guarantee on all our electronics and tech accessories.",
    ),
    (
        "warranty",
        "All our products come with a 1-year warranty for your peace of mind.",
    ),
    (
        "hello",
        "Hello! I'm your AI support assistant. How can I help you today?",
    ),
    ("hi", "Hi there! How can I assist you today?"),
    (
        "help",
        "I can help you with questions about shipping, returns, our products, support hours, and more. What would you like to know?",
    ),
];

/// Reply used when no keyword matches.
pub const DEFAULT_FALLBACK: &str = "I'm sorry, but I'm currently unable to process your request. Our support team is available Monday-Friday 9 AM - 6 PM EST and Saturday 10 AM - 4 PM EST. Please contact us during those hours for assistance.";

/// Case-insensitive substring lookup; first key in table order wins.
pub fn fallback_reply(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    FALLBACK_RESPONSES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_FALLBACK)
}
