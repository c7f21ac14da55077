/// Rounds `value` up to the machine word size.
///
/// # Examples
///
/// ```rust
/// use std::mem;
/// use freelist_heap::align;
///
/// match mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align::round_up($value, ::std::mem::size_of::<usize>())
  };
}

/// Returns the smallest multiple of `multiple` that is `>= value`.
///
/// A `multiple` of zero is a no-op and hands `value` back unchanged.
/// Values already on a boundary are returned as they are, so rounding twice
/// gives the same answer as rounding once.
///
/// ```rust
/// use freelist_heap::align::round_up;
///
/// assert_eq!(round_up(10, 8), 16);
/// assert_eq!(round_up(16, 8), 16);
/// assert_eq!(round_up(7, 0), 7);
/// ```
pub const fn round_up(
  value: usize,
  multiple: usize,
) -> usize {
  if multiple == 0 {
    return value;
  }

  match value % multiple {
    0 => value,
    rem => value + (multiple - rem),
  }
}

/// Returns the smallest power of two strictly greater than `n`.
///
/// Handy for picking a region size: `next_power_of_two(100)` is `128`, and
/// `next_power_of_two(128)` is `256`.
pub const fn next_power_of_two(n: usize) -> usize {
  let mut value: usize = 1;
  while value <= n {
    value <<= 1;
  }
  value
}

#[cfg(test)]
mod tests {
  use std::mem;

  use proptest::prelude::*;

  use super::*;

  #[test]
  fn test_round_up_fills_each_bucket() {
    for multiple in [1, 4, 8, 24] {
      for bucket in 0..6 {
        let top = multiple * (bucket + 1);
        for value in (multiple * bucket + 1)..=top {
          assert_eq!(round_up(value, multiple), top, "{value} by {multiple}");
        }
      }
    }
  }

  #[test]
  fn test_align_uses_word_size() {
    let word = mem::size_of::<usize>();
    assert_eq!(align!(1), word);
    assert_eq!(align!(word), word);
    assert_eq!(align!(word + 1), 2 * word);
    assert_eq!(align!(10), round_up(10, word));
  }

  #[test]
  fn test_round_up_boundaries() {
    assert_eq!(round_up(0, 8), 0);
    assert_eq!(round_up(1, 8), 8);
    assert_eq!(round_up(8, 8), 8);
    assert_eq!(round_up(9, 8), 16);
    assert_eq!(round_up(15, 10), 20);
    assert_eq!(round_up(42, 0), 42);
  }

  #[test]
  fn test_next_power_of_two() {
    assert_eq!(next_power_of_two(0), 1);
    assert_eq!(next_power_of_two(1), 2);
    assert_eq!(next_power_of_two(100), 128);
    assert_eq!(next_power_of_two(128), 256);
    assert_eq!(next_power_of_two(1023), 1024);
  }

  proptest! {
    #[test]
    fn round_up_is_idempotent(x in 0usize..1 << 40, m in 1usize..4096) {
      let once = round_up(x, m);
      prop_assert_eq!(round_up(once, m), once);
      prop_assert!(once >= x);
      prop_assert!(once - x < m);
      prop_assert_eq!(once % m, 0);
    }

    #[test]
    fn round_up_by_zero_is_identity(x in any::<u32>()) {
      prop_assert_eq!(round_up(x as usize, 0), x as usize);
    }

    #[test]
    fn next_power_of_two_exceeds_input(n in 0usize..1 << 40) {
      let p = next_power_of_two(n);
      prop_assert!(p.is_power_of_two());
      prop_assert!(p > n);
      prop_assert!(p / 2 <= n);
    }
  }
}
