//! Groups nearby candidate variants into hypothesis sets: variants on the
//! same contig within `distlim` bases of each other are evaluated together,
//! and any set that still has two or more variants stacked on the exact
//! same position is split until every remaining group is position-unique.

use crate::variant::Variant;

/// `variants` must already be sorted (see [`crate::variant::Variant`]'s
/// `Ord` impl / the order `io::vcf::read_vcf` returns).
pub fn group_variants(variants: &[Variant], distlim: i64) -> Vec<Vec<Variant>> {
    let mut sets = group_by_proximity(variants, distlim);
    split_same_position_ties(&mut sets);
    sets
}

fn group_by_proximity(variants: &[Variant], distlim: i64) -> Vec<Vec<Variant>> {
    let mut sets = Vec::new();
    let mut i = 0;
    while i < variants.len() {
        let mut curr = vec![variants[i].clone()];
        let mut j = i + 1;
        while distlim > 0
            && j < variants.len()
            && variants[j].chr.eq_ignore_ascii_case(&variants[j - 1].chr)
            && (variants[j].pos - variants[j - 1].pos).abs() <= distlim
        {
            curr.push(variants[j].clone());
            j += 1;
        }
        i = j;
        sets.push(curr);
    }
    sets
}

/// Iterates to a fixed point: a set with two variants at the same position
/// becomes two sets, one keeping the earlier of the pair and one keeping the
/// later; repeat until no set has an adjacent same-position pair left.
fn split_same_position_ties(sets: &mut Vec<Vec<Variant>>) {
    loop {
        let mut additions = Vec::new();
        let mut any_split = false;

        for set in sets.iter_mut() {
            if set.len() < 2 {
                continue;
            }
            let mut j = 0;
            while j + 1 < set.len() {
                if set[j].pos == set[j + 1].pos {
                    any_split = true;
                    let mut dup = set.clone();
                    set.remove(j);
                    dup.remove(j + 1);
                    additions.push(dup);
                } else {
                    j += 1;
                }
            }
        }

        sets.extend(additions);
        if !any_split {
            break;
        }
    }
}
