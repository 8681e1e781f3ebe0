//! Hand-curated evergreen links served when live aggregation yields nothing.

use crate::ingest::item_id;
use crate::ingest::types::{Category, NormalizedItem, Region};

struct Entry {
    title: &'static str,
    url: &'static str,
    source: &'static str,
    summary: &'static str,
    tags: &'static [Category],
    region: Region,
}

use Category::{Cybersecurity as Sec, Research as Res, Software as Sw, AI};
use Region::{International as Intl, Local};

const fn e(
    title: &'static str,
    url: &'static str,
    source: &'static str,
    summary: &'static str,
    tags: &'static [Category],
    region: Region,
) -> Entry {
    Entry {
        title,
        url,
        source,
        summary,
        tags,
        region,
    }
}

const ENTRIES: &[Entry] = &[
    e("arXiv Computer Science (cs)", "https://arxiv.org/list/cs/recent", "arXiv", "Latest computer science preprints.", &[Res], Intl),
    e("arXiv AI (cs.AI)", "https://arxiv.org/list/cs.AI/recent", "arXiv", "Artificial intelligence preprints.", &[AI, Res], Intl),
    e("arXiv Machine Learning (cs.LG)", "https://arxiv.org/list/cs.LG/recent", "arXiv", "Machine learning and neural networks.", &[AI, Res], Intl),
    e("arXiv Cryptography (cs.CR)", "https://arxiv.org/list/cs.CR/recent", "arXiv", "Cryptography and security.", &[Sec, Res], Intl),
    e("Hacker News – Computer Science", "https://hn.algolia.com/?query=computer%20science&sort=byDate", "Hacker News", "Stories tagged or about computer science.", &[Sw, Res], Intl),
    e("Hacker News – Artificial Intelligence", "https://hn.algolia.com/?query=artificial%20intelligence&sort=byDate", "Hacker News", "AI and ML discussions.", &[AI], Intl),
    e("IEEE Spectrum Computing", "https://spectrum.ieee.org/computing", "IEEE Spectrum", "Computing and technology news.", &[Res, Sw], Intl),
    e("ACM News", "https://news.acm.org/", "ACM", "Association for Computing Machinery news.", &[Res], Intl),
    e("MIT Technology Review", "https://www.technologyreview.com/", "MIT Technology Review", "Technology and innovation.", &[Res, AI], Intl),
    e("Ars Technica", "https://arstechnica.com/", "Ars Technica", "Technology and science.", &[Sw, Sec], Intl),
    e("The Verge", "https://www.theverge.com/tech", "The Verge", "Tech and science coverage.", &[Sw], Intl),
    e("Wired – Security", "https://www.wired.com/tag/security/", "Wired", "Cybersecurity and privacy.", &[Sec], Intl),
    e("Google AI Blog", "https://blog.google/technology/ai/", "Google AI", "Google AI research and updates.", &[AI], Intl),
    e("DeepMind Blog", "https://deepmind.google/blog", "DeepMind", "DeepMind research and news.", &[AI], Intl),
    e("OpenAI Blog", "https://openai.com/blog", "OpenAI", "OpenAI updates and research.", &[AI], Intl),
    e("Microsoft Research", "https://www.microsoft.com/en-us/research/blog/", "Microsoft Research", "Microsoft Research blog.", &[Res, AI], Intl),
    e("AWS News Blog", "https://aws.amazon.com/blogs/aws/", "AWS", "Amazon Web Services updates.", &[Sw], Intl),
    e("GitHub Blog", "https://github.blog/", "GitHub", "Developer and platform news.", &[Sw], Intl),
    e("Krebs on Security", "https://krebsonsecurity.com/", "Krebs on Security", "Cybersecurity investigations.", &[Sec], Intl),
    e("Schneier on Security", "https://www.schneier.com/", "Schneier on Security", "Security and privacy.", &[Sec], Intl),
    e("arXiv Software Engineering (cs.SE)", "https://arxiv.org/list/cs.SE/recent", "arXiv", "Software engineering preprints.", &[Sw, Res], Intl),
    e("arXiv Neural and Evolutionary (cs.NE)", "https://arxiv.org/list/cs.NE/recent", "arXiv", "Neural and evolutionary computation.", &[AI, Res], Intl),
    e("ITWeb South Africa", "https://www.itweb.co.za/", "ITWeb", "South African technology news.", &[Sw], Local),
    e("MyBroadband", "https://mybroadband.co.za/news/", "MyBroadband", "South African tech and broadband.", &[Sw], Local),
    e("The Conversation – Technology", "https://theconversation.com/africa/topics/technology-719", "The Conversation", "Expert analysis on technology.", &[Res], Local),
    e("TechCentral", "https://techcentral.co.za/", "TechCentral", "South African tech news.", &[Sw], Local),
    e("Stellenbosch University", "https://www.sun.ac.za/english", "Stellenbosch University", "Stellenbosch University news.", &[Res], Local),
    e("Nature – Computer Science", "https://www.nature.com/subjects/computer-science", "Nature", "Computer science research.", &[Res], Intl),
    e("ScienceDaily – Computers & Math", "https://www.sciencedaily.com/news/computers_math/", "ScienceDaily", "Computing and mathematics news.", &[Res], Intl),
    e("VentureBeat – AI", "https://venturebeat.com/ai/", "VentureBeat", "AI and machine learning news.", &[AI], Intl),
    e("TechCrunch", "https://techcrunch.com/", "TechCrunch", "Startups and technology.", &[Sw], Intl),
    e("ZDNet – Security", "https://www.zdnet.com/topic/security/", "ZDNet", "Security news and analysis.", &[Sec], Intl),
    e("Dark Reading", "https://www.darkreading.com/", "Dark Reading", "Cybersecurity news.", &[Sec], Intl),
    e("arXiv Human-Computer Interaction (cs.HC)", "https://arxiv.org/list/cs.HC/recent", "arXiv", "HCI preprints.", &[Res, Sw], Intl),
    e("arXiv Robotics (cs.RO)", "https://arxiv.org/list/cs.RO/recent", "arXiv", "Robotics preprints.", &[Res, AI], Intl),
    e("Python Software Foundation News", "https://pyfound.blogspot.com/", "PSF", "Python language and community.", &[Sw], Intl),
    e("Mozilla Hacks", "https://hacks.mozilla.org/", "Mozilla", "Web and browser technology.", &[Sw], Intl),
    e("Cloudflare Blog", "https://blog.cloudflare.com/", "Cloudflare", "Cloud and security updates.", &[Sw, Sec], Intl),
    e("Netflix Tech Blog", "https://netflixtechblog.com/", "Netflix", "Engineering at scale.", &[Sw], Intl),
    e("Meta Research", "https://research.facebook.com/blog/", "Meta Research", "Meta AI and systems research.", &[AI, Res], Intl),
];

/// The fallback list, timestamped now. Static category is the first tag.
pub fn fallback_items() -> Vec<NormalizedItem> {
    let now = chrono::Utc::now().to_rfc3339();
    ENTRIES
        .iter()
        .map(|en| NormalizedItem {
            id: item_id(en.url),
            title: en.title.to_string(),
            url: en.url.to_string(),
            source_name: en.source.to_string(),
            published_at: now.clone(),
            summary: en.summary.to_string(),
            image: None,
            category: en.tags.first().copied().unwrap_or(Category::Research),
            region: en.region,
            category_tags: en.tags.to_vec(),
        })
        .collect()
}
