use docqa_core::chunker::{Chunker, ChunkingConfig};

fn sentence(seed: usize, len: usize) -> String {
    // `len` chars ending with a period, no internal sentence terminators
    let mut s = format!("Sentence {seed} talks about soil and water");
    while s.chars().count() < len - 1 { s.push_str(" x"); }
    s.truncate(len - 1);
    s.push('.');
    s
}

#[test]
fn short_document_yields_no_chunks() {
    let chunks = Chunker::default().chunk("Short.", "a.pdf");
    assert!(chunks.is_empty());
}

#[test]
fn empty_text_yields_no_chunks() {
    assert!(Chunker::default().chunk("", "a.pdf").is_empty());
    assert!(Chunker::default().chunk("\n\n   \n\n", "a.pdf").is_empty());
}

#[test]
fn paragraphs_are_split_on_blank_lines_and_short_ones_dropped() {
    let p1 = "The first paragraph explains how rainwater is collected in barrels.";
    let p2 = "Too short.";
    let p3 = "The third paragraph describes filtering the collected water through sand.";
    let text = format!("{p1}\n\n\n  \n{p2}\n \n{p3}\n");
    let chunks = Chunker::default().chunk(&text, "water.txt");
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec![p1, p3]);
    assert!(chunks.iter().all(|c| c.source_document == "water.txt"));
}

#[test]
fn paragraph_at_max_length_is_kept_verbatim() {
    let para = "a".repeat(1000);
    let chunks = Chunker::default().chunk(&para, "doc");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, para);
}

#[test]
fn long_paragraph_is_packed_into_two_chunks() {
    let sentences: Vec<String> = (0..12).map(|i| sentence(i, 125)).collect();
    let para = sentences.join(" ");
    assert!(para.chars().count() > 1500);

    let chunks = Chunker::default().chunk(&para, "long.pdf");
    assert_eq!(chunks.len(), 2);
    for c in &chunks { assert!(c.text.chars().count() <= 1000, "chunk too long: {}", c.text.len()); }
    let rejoined = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
    assert_eq!(rejoined, para);
}

#[test]
fn oversized_sentence_is_never_truncated() {
    let huge = format!("{}.", "word ".repeat(300).trim_end());
    let para = format!("{} {huge} {}", sentence(1, 120), sentence(2, 120));
    let chunks = Chunker::default().chunk(&para, "doc");
    assert!(chunks.iter().any(|c| c.text == huge));
    let rejoined = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
    assert_eq!(rejoined, para);
}

#[test]
fn chunk_bounds_hold_across_mixed_input() {
    let mut text = String::new();
    for i in 0..6 {
        let n = 3 + i * 4;
        let para: Vec<String> = (0..n).map(|j| sentence(i * 100 + j, 60 + (j * 37) % 150)).collect();
        text.push_str(&para.join(if i % 2 == 0 { " " } else { "\n" }));
        text.push_str("\n\n");
        text.push_str("tiny\n\n");
    }
    let chunks = Chunker::new(ChunkingConfig::default()).chunk(&text, "mixed");
    assert!(!chunks.is_empty());
    for c in &chunks {
        let len = c.text.trim().chars().count();
        assert!(len >= 50, "chunk below minimum: {len}");
        assert!(len <= 1000, "chunk above maximum: {len}");
    }
}

#[test]
fn chunks_follow_document_order() {
    let paras: Vec<String> = (0..5).map(|i| format!("Paragraph number {i} is long enough to be kept as its own chunk.")).collect();
    let chunks = Chunker::default().chunk(&paras.join("\n\n"), "ordered");
    let texts: Vec<String> = chunks.into_iter().map(|c| c.text).collect();
    assert_eq!(texts, paras);
}

#[test]
fn lengths_count_characters_not_bytes() {
    // 40 chars but 80 bytes: below the minimum
    let para = "é".repeat(40);
    assert!(Chunker::default().chunk(&para, "fr").is_empty());
    // 1000 chars but 2000 bytes: still a single chunk
    let para = "é".repeat(1000);
    assert_eq!(Chunker::default().chunk(&para, "fr").len(), 1);
}

#[test]
fn short_trailing_sentence_is_kept() {
    let tail = "The tail holds the key fact here, ok no.";
    assert_eq!(tail.chars().count(), 40);
    let para = format!("{} {tail}", sentence(7, 990));
    assert_eq!(para.chars().count(), 1031);

    let chunks = Chunker::default().chunk(&para, "notes.txt");
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec![sentence(7, 990).as_str(), tail]);
}

#[test]
fn short_sentence_before_oversized_sentence_is_kept() {
    let lead = "Water the seedlings before the frost.";
    let huge = format!("{}.", "compost ".repeat(140).trim_end());
    assert!(huge.chars().count() > 1000);
    let para = format!("{lead} {huge}");

    let chunks = Chunker::default().chunk(&para, "garden.md");
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec![lead, huge.as_str()]);
}
