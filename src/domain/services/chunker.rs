/// Character bound for one indexed chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Split transcript text into bounded chunks along line breaks.
///
/// Lines are packed greedily into the current chunk until appending the
/// next line would reach the bound; chunks are trimmed and never empty.
/// A single line longer than the bound becomes its own oversized chunk.
/// Chunk order follows source order, with no overlap.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if current.len() + line.len() < max_chars {
            current.push_str(line);
            current.push('\n');
        } else {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
            current.clear();
            current.push_str(line);
            current.push('\n');
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(chunk_text("", 500).is_empty());
        assert!(chunk_text("\n\n\n", 500).is_empty());
    }

    #[test]
    fn test_single_small_chunk() {
        let chunks = chunk_text("hello\nworld", 500);
        assert_eq!(chunks, vec!["hello\nworld"]);
    }

    #[test]
    fn test_chunks_respect_bound() {
        let text: String = (0..50).map(|i| format!("line number {i}")).collect::<Vec<_>>().join("\n");
        let chunks = chunk_text(&text, 100);
        for chunk in &chunks {
            assert!(chunk.len() <= 100, "chunk exceeded bound: {} chars", chunk.len());
        }
        assert!(chunks.len() > 1);
    }

    #[test]
    fn test_oversized_line_becomes_own_chunk() {
        let long_line = "x".repeat(300);
        let text = format!("short\n{long_line}\nshort again");
        let chunks = chunk_text(&text, 100);
        assert!(chunks.iter().any(|c| c == &long_line));
    }

    #[test]
    fn test_reconstruction_preserves_nonblank_lines_in_order() {
        let text = "alpha\n\nbravo\ncharlie\n\n\ndelta";
        let chunks = chunk_text(text, 12);
        let reconstructed: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.lines())
            .filter(|l| !l.trim().is_empty())
            .collect();
        let expected: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(reconstructed, expected);
    }

    #[test]
    fn test_no_empty_chunks() {
        let long_line = "y".repeat(600);
        let text = format!("{long_line}\n{long_line}");
        let chunks = chunk_text(&text, 500);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_chunks_are_trimmed() {
        let chunks = chunk_text("  padded line  \nnext", 500);
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].starts_with(' '));
        assert!(!chunks[0].ends_with(' '));
    }
}
