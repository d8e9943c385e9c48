//! Built-in inspiration excerpts loaded into an empty store.

use crate::db::models::NewInspiration;

struct Excerpt {
    title: &'static str,
    author: &'static str,
    content: &'static str,
    category: &'static str,
    source: &'static str,
    tags: &'static [&'static str],
    difficulty: &'static str,
    word_count: i32,
    read_time: i32,
}

const EXCERPTS: &[Excerpt] = &[
    Excerpt {
        title: "On the Art of Writing",
        author: "Stephen King",
        content: "The scariest moment is always just before you start. After that, things can only get better. Writing is magic, as much the water of life as any other creative art. The water is free. So drink. Drink and be filled up.

When you write a story, you're telling yourself the story. When you rewrite, your main job is taking out all the things that are not the story. Your stuff starts out being just for you, but then it goes out. Once you know what the story is and get it right — as right as you can, anyway — it belongs to anyone who wants to read it. Or criticize it.

The real importance of reading is that it creates an ease and intimacy with the process of writing; one comes to the country of the writer with one's papers and identification pretty much in order. The only way to do it is to do it, and the only way to get better at it is to do it more.",
        category: "literature",
        source: "On Writing: A Memoir of the Craft",
        tags: &["writing", "creativity", "craft", "inspiration"],
        difficulty: "intermediate",
        word_count: 180,
        read_time: 2,
    },
    Excerpt {
        title: "The Power of Observation",
        author: "Maya Angelou",
        content: "There is no greater agony than bearing an untold story inside you. I've learned that people will forget what you said, people will forget what you did, but people will never forget how you made them feel.

To be able to write, one must be a reader. And when you read, you should be observing the world through a different lens. Every person you meet, every place you visit, every moment you experience—these are the raw materials of your writing. The writer who observes the world with honesty and compassion will always have something valuable to say.

Writing is an act of courage. It requires vulnerability, a willingness to expose oneself to judgment and criticism. But it is also an act of generosity—you are sharing a piece of yourself with the world.",
        category: "literature",
        source: "The Heart of a Woman",
        tags: &["observation", "empathy", "courage", "storytelling"],
        difficulty: "intermediate",
        word_count: 150,
        read_time: 2,
    },
    Excerpt {
        title: "The Scientific Method",
        author: "Carl Sagan",
        content: "Science is not only compatible with spirituality; it is a profound source of spirituality. When we recognize our place in an immensity of light-years and in the passage of ages, when we grasp the intricacy, beauty, and subtlety of life, then that soaring feeling, that sense of elation and humility combined, is surely spiritual.

The notion that science and spirituality are somehow mutually exclusive does a disservice to both. Science is not only about cold, hard facts—it's about wonder, about awe, about the incredible interconnectedness of all things. The more we learn about the universe, the more we realize how much we don't know, and that realization should fill us with humility and curiosity, not fear.",
        category: "science",
        source: "The Demon-Haunted World",
        tags: &["science", "spirituality", "wonder", "universe"],
        difficulty: "intermediate",
        word_count: 130,
        read_time: 2,
    },
    Excerpt {
        title: "The Examined Life",
        author: "Socrates",
        content: "The unexamined life is not worth living. This famous declaration from my defense in Athens speaks to the core of human existence. We must constantly question our beliefs, our actions, and our assumptions. Only through rigorous self-examination can we hope to live a life of meaning and virtue.

Wisdom begins with knowing that we know nothing. The moment we think we have all the answers is the moment we stop growing, stop learning, stop becoming better human beings. True knowledge is understanding the limits of our knowledge.

I have spent my life as a gadfly, stinging the lazy horse of Athens into action, forcing people to think about their lives and their choices. This is not comfortable work, neither for me nor for those I question. But comfort is not the goal—truth is the goal, and truth requires courage.",
        category: "philosophy",
        source: "Plato's Apology",
        tags: &["wisdom", "self-knowledge", "virtue", "truth"],
        difficulty: "advanced",
        word_count: 160,
        read_time: 2,
    },
    Excerpt {
        title: "The Digital Revolution",
        author: "Tim Berners-Lee",
        content: "The original idea of the web was that it should be a collaborative space where you could communicate through sharing information. The dream behind the Web is of a common information space in which we communicate by sharing information.

What we have today is not quite that vision. We have created a world wide web, but in many ways it has become a world wide surveillance system. The power of the web lies not in its technology, but in its ability to connect human beings and allow them to work together in ways that were never before possible.

We must reclaim the web as a force for good, as a tool for human empowerment rather than human exploitation. This requires not just technological solutions, but social and political ones as well. The future of the web is the future of democracy itself.",
        category: "technology",
        source: "Weaving the Web",
        tags: &["internet", "technology", "democracy", "collaboration"],
        difficulty: "intermediate",
        word_count: 140,
        read_time: 2,
    },
    Excerpt {
        title: "Climate Change and Human Responsibility",
        author: "Elizabeth Kolbert",
        content: "We are living through the sixth mass extinction, and this time, we are the asteroid. The rate of species loss today is estimated to be between 1,000 and 10,000 times higher than the natural background rate. Unlike the five previous mass extinctions, this one is entirely of our own making.

Climate change is not just about polar bears or melting ice caps—it's about the fundamental systems that make life on Earth possible. When we alter the chemistry of the atmosphere and the oceans, we are conducting a vast experiment with the only planet we have.

The challenge is not just technological or economic—it's moral. We have a responsibility to future generations to leave them a world that is at least as rich and vibrant as the one we inherited. This requires unprecedented cooperation and sacrifice, but the alternative is unthinkable.",
        category: "environment",
        source: "The Sixth Extinction",
        tags: &["climate change", "extinction", "environment", "responsibility"],
        difficulty: "intermediate",
        word_count: 150,
        read_time: 2,
    },
];

pub(super) fn builtin_inspirations() -> Vec<NewInspiration> {
    EXCERPTS
        .iter()
        .map(|e| NewInspiration {
            title: e.title.to_string(),
            author: e.author.to_string(),
            content: e.content.to_string(),
            category: e.category.to_string(),
            kind: "excerpt".to_string(),
            source: Some(e.source.to_string()),
            tags: e.tags.iter().map(|t| t.to_string()).collect(),
            difficulty: e.difficulty.to_string(),
            word_count: e.word_count,
            read_time: e.read_time,
            is_public: true,
        })
        .collect()
}
