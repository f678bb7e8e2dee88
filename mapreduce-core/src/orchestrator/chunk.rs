/// Split `items` into `parts` contiguous chunks.
///
/// Every chunk but the last holds `items.len() / parts` items; the last one
/// absorbs the remainder. With fewer items than parts, the leading chunks are
/// empty and the last chunk holds everything.
pub fn split_chunks<T>(items: &[T], parts: usize) -> Vec<&[T]> {
    if parts == 0 {
        return Vec::new();
    }

    let chunk_size = items.len() / parts;
    (0..parts)
        .map(|index| {
            let start = index * chunk_size;
            let end = if index + 1 == parts {
                items.len()
            } else {
                start + chunk_size
            };
            &items[start..end]
        })
        .collect()
}
