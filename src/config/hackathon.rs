//! Static event details. The chat assistant's system prompt is built from these.

pub const NAME: &str = "Uniswap AI Hackathon";
pub const TAGLINE: &str = "Software with agency.";
pub const DESCRIPTION: &str = "Build AI-native tools for the Uniswap ecosystem.";
pub const START_DATE: &str = "February 9, 2026";
pub const DEADLINE: &str = "February 20, 2026 at 11:59 PM UTC";

/// Project categories for submissions. The forum has its own list.
pub const PROJECT_CATEGORIES: &[&str] = &["DeFi Automation", "Developer Tooling", "Community and Social"];

/// Fallback category when a submission body has no `### Category` section.
pub const DEFAULT_PROJECT_CATEGORY: &str = "DeFi Automation";

pub const PRIZES: &[(&str, &str)] = &[
    ("1st place", "$20,000 USDC"),
    ("2nd place", "$15,000 USDC"),
    ("3rd place", "$10,000 USDC"),
    ("Community Favorite", "$5,000 USDC"),
];

pub const HOW_TO_STEPS: &[(&str, &str)] = &[
    (
        "Build Your Project",
        "Create an AI-powered tool that integrates with the Uniswap API and ecosystem.",
    ),
    (
        "Push to GitHub",
        "Make your project open source on GitHub with clear documentation.",
    ),
    (
        "Submit via GitHub Issue",
        "Use the Hackathon Submission template in the uniswap-ai repo to submit your project.",
    ),
    (
        "Project Review",
        "The Uniswap judging panel will review submissions based on innovation, technical execution, and usefulness.",
    ),
];

pub const FAQ: &[(&str, &str)] = &[
    (
        "Who can participate?",
        "Anyone! Whether you are a solo developer or a team of up to 5, all skill levels are welcome.",
    ),
    (
        "What can I build?",
        "Anything that combines AI with the Uniswap ecosystem. Trading bots, analytics tools, developer utilities, and more. All projects should integrate the Uniswap Trading API.",
    ),
    (
        "How do I submit?",
        "Create a GitHub Issue in the uniswap-ai repository using the Hackathon Submission template. Include your project description, repo link, and team info.",
    ),
    (
        "When is the deadline?",
        "All submissions must be made by February 20, 2026 at 11:59 PM UTC.",
    ),
    (
        "Do I need to use Uniswap SDKs?",
        "Not required, but encouraged. Projects that integrate with Uniswap protocols, SDKs, or data will be given preference.",
    ),
    (
        "Is there a team size limit?",
        "Teams can have up to 5 members. Solo participants are also welcome.",
    ),
];
