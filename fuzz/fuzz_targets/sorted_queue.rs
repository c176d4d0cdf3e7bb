#![no_main]

use arbitrary::{Arbitrary, Unstructured};

use libfuzzer_sys::fuzz_target;
use sweepclip::treevec::TreeVec;

/// The things the sweep does to its event queue and its sweep line.
#[derive(Arbitrary, Debug)]
enum Op {
    Insert(i16),
    Remove(i16),
    PopFirst,
}

fn arbitrary_ops(mut u: Unstructured) -> Result<(), arbitrary::Error> {
    let len = u.arbitrary_len::<Op>()?;
    let mut vec: Vec<i16> = Vec::new();
    let mut tree_vec = TreeVec::<i16, 4>::new();
    for _ in 0..len {
        match u.arbitrary::<Op>()? {
            Op::Insert(x) => {
                let idx = tree_vec.insert_sorted(x, |a, b| a.cmp(b));
                let expected = vec.partition_point(|y| y <= &x);
                vec.insert(expected, x);
                assert_eq!(idx, expected);
            }
            Op::Remove(x) => {
                let found = tree_vec.find_sorted(&x, |a, b| a.cmp(b));
                assert_eq!(found.is_some(), vec.contains(&x));
                if let Some(idx) = found {
                    assert_eq!(tree_vec.remove(idx), x);
                    let pos = vec.partition_point(|y| y < &x);
                    vec.remove(pos);
                }
            }
            Op::PopFirst => {
                let expected = (!vec.is_empty()).then(|| vec.remove(0));
                assert_eq!(tree_vec.pop_first(), expected);
            }
        }

        assert_eq!(tree_vec.len(), vec.len());
        assert_eq!(tree_vec.iter().copied().collect::<Vec<_>>(), vec);
    }
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let _ = arbitrary_ops(Unstructured::new(data));
});
