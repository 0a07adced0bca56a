use std::error::Error;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;

/// Every way of picking one element from each list, in order. The first list
/// varies slowest. Clones the elements.
///
/// ```
/// let sides = vec![vec!["a", "b"], vec!["x"], vec!["1", "2"]];
///
/// assert_eq!(thicket::utils::combinations(&sides), vec![
///   vec!["a", "x", "1"],
///   vec!["a", "x", "2"],
///   vec!["b", "x", "1"],
///   vec!["b", "x", "2"],
/// ]);
/// ```
pub fn combinations<T>(list: &[Vec<T>]) -> Vec<Vec<T>>
where
  T: Clone,
{
  let Some((first, rest)) = list.split_first() else {
    return Vec::new();
  };

  let mut out = first.iter().map(|e| vec![e.clone()]).collect::<Vec<_>>();
  for choices in rest {
    out = out
      .iter()
      .flat_map(|prefix| {
        choices.iter().map(move |c| {
          let mut seq = prefix.clone();
          seq.push(c.clone());
          seq
        })
      })
      .collect();
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_choice_kills_everything() {
    let v: Vec<Vec<u8>> = vec![vec![1, 2], vec![]];
    assert!(combinations(&v).is_empty());
    assert!(combinations::<u8>(&[]).is_empty());
  }
}
