//! Rewrite passes over layered circuits.
//!
//! Every pass is a total function from layer circuit to layer circuit and
//! returns a fresh value; passes are composable and idempotent on their
//! fixed points. The only fallible pass is
//! [`LayerCircuit::with_qubit_coords_at_start`], which can detect malformed
//! coordinate annotations.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::circuit::LayerCircuit;
use crate::error::{LayerError, LayerResult};
use crate::layers::{Layer, LayerKind, LoopLayer, MeasureLayer, QubitCoordAnnotationLayer};
use crate::rot::NamedRotation;

/// Unwrap the single fused layer a same-kind disjoint merge must produce.
fn single_fused(merged: Vec<Layer>) -> Layer {
    let mut iter = merged.into_iter();
    match (iter.next(), iter.next()) {
        (Some(layer), None) => layer,
        _ => unreachable!("same-kind disjoint layers must fuse into exactly one layer"),
    }
}

impl LayerCircuit {
    /// Hoist all qubit-coordinate annotations to the front of the circuit,
    /// folding coordinate shifts into them along the way.
    pub fn with_qubit_coords_at_start(&self) -> LayerResult<LayerCircuit> {
        let mut merged_layer = QubitCoordAnnotationLayer::default();
        let mut rev_layers: Vec<Layer> = Vec::new();
        for layer in self.layers.iter().rev() {
            match layer {
                Layer::QubitCoords(coords) => {
                    let mut duplicates: Vec<u32> = coords
                        .coords
                        .keys()
                        .filter(|q| merged_layer.coords.contains_key(q))
                        .copied()
                        .collect();
                    if !duplicates.is_empty() {
                        duplicates.sort_unstable();
                        return Err(LayerError::DuplicateQubitCoords(duplicates));
                    }
                    merged_layer
                        .coords
                        .extend(coords.coords.iter().map(|(&q, c)| (q, c.clone())));
                }
                Layer::ShiftCoords(shift) => {
                    merged_layer.offset_by(&shift.shift);
                    rev_layers.push(layer.clone());
                }
                Layer::Loop(_) => {
                    if !merged_layer.coords.is_empty() {
                        return Err(LayerError::CoordsAcrossLoop);
                    }
                    rev_layers.push(layer.clone());
                }
                _ => rev_layers.push(layer.clone()),
            }
        }
        rev_layers.push(Layer::QubitCoords(merged_layer));
        rev_layers.reverse();
        Ok(LayerCircuit::from_layers(rev_layers))
    }

    /// Single left-to-right pass fusing adjacent layers via
    /// [`Layer::locally_optimized`], dropping vacuous tails as it goes.
    #[must_use]
    pub fn with_locally_optimized_layers(&self) -> LayerCircuit {
        fn do_layer(new_layers: &mut Vec<Layer>, layer: Option<Layer>) {
            match new_layers.pop() {
                Some(last) => {
                    let fused = last.locally_optimized(layer.as_ref());
                    new_layers.extend(fused);
                }
                None => new_layers.extend(layer),
            }
            while new_layers.last().is_some_and(Layer::is_vacuous) {
                new_layers.pop();
            }
        }

        let mut new_layers: Vec<Layer> = Vec::new();
        for layer in &self.layers {
            for optimized in layer.locally_optimized(None) {
                do_layer(&mut new_layers, Some(optimized));
            }
        }
        do_layer(&mut new_layers, None);
        debug!(
            before = self.layers.len(),
            after = new_layers.len(),
            "locally optimized layers"
        );
        LayerCircuit::from_layers(new_layers)
    }

    /// The qubits reset by the layer at index `k` before anything else
    /// touches them: a Reset layer's targets, a Loop's leading resets, or
    /// `end_resets` past the end of the circuit.
    fn resets_at_layer(&self, k: usize, end_resets: &FxHashSet<u32>) -> FxHashSet<u32> {
        match self.layers.get(k) {
            None => end_resets.clone(),
            Some(Layer::Reset(reset)) => reset.targets.keys().copied().collect(),
            Some(Layer::Loop(inner)) => inner.body.resets_at_layer(0, &FxHashSet::default()),
            Some(_) => FxHashSet::default(),
        }
    }

    /// Remove rotations that are immediately followed (on their qubit) by a
    /// reset, including across loop boundaries.
    #[must_use]
    pub fn with_rotations_before_resets_removed(&self) -> LayerCircuit {
        self.rotations_before_resets_removed(&FxHashSet::default())
    }

    fn rotations_before_resets_removed(
        &self,
        loop_boundary_resets: &FxHashSet<u32>,
    ) -> LayerCircuit {
        let all_touched = self.touched();
        let mut sets: Vec<FxHashSet<u32>> = self.layers.iter().map(Layer::touched).collect();
        sets.push(all_touched.clone());
        let mut resets: Vec<FxHashSet<u32>> = (0..self.layers.len())
            .map(|k| self.resets_at_layer(k, &all_touched))
            .collect();
        // Past the end, a qubit only counts as reset when both the loop exit
        // and the next iteration's head reset it.
        let head_resets = resets.first().cloned().unwrap_or_default();
        resets.push(
            loop_boundary_resets
                .intersection(&head_resets)
                .copied()
                .collect(),
        );

        let mut new_layers: Vec<Layer> = self.layers.clone();
        for k in 0..new_layers.len() {
            let next_resets = self.resets_at_layer(k + 1, &all_touched);
            match &mut new_layers[k] {
                Layer::Loop(loop_layer) => {
                    loop_layer.body = loop_layer.body.rotations_before_resets_removed(&next_resets);
                }
                Layer::Rotation(rotation) => {
                    let mut drops = Vec::new();
                    for (&qubit, named) in &rotation.named_rotations {
                        if named.is_identity() {
                            continue;
                        }
                        let mut k2 = k + 1;
                        while k2 < sets.len() {
                            if sets[k2].contains(&qubit) {
                                if resets[k2].contains(&qubit) {
                                    drops.push(qubit);
                                }
                                break;
                            }
                            k2 += 1;
                        }
                    }
                    for qubit in drops {
                        rotation.named_rotations.remove(&qubit);
                    }
                }
                _ => {}
            }
        }

        LayerCircuit::from_layers(new_layers.into_iter().filter(|l| !l.is_vacuous()).collect())
    }

    /// Remove rotation layers where every rotation in the layer can be moved
    /// to another rotation layer.
    ///
    /// Each individual rotation can move through intermediate non-rotation
    /// layers as long as those layers don't touch the qubit being rotated.
    /// Leftward homes absorb by appending, rightward homes by prepending.
    #[must_use]
    pub fn with_clearable_rotation_layers_cleared(&self) -> LayerCircuit {
        fn scan(
            new_layers: &[Layer],
            sets: &[FxHashSet<u32>],
            qubit: u32,
            start_layer: usize,
            delta: isize,
        ) -> Option<usize> {
            let mut index = start_layer as isize;
            loop {
                index += delta;
                if index < 0 || index as usize >= sets.len() {
                    return None;
                }
                let at = index as usize;
                if let Layer::Rotation(rotation) = &new_layers[at] {
                    if !rotation.is_vacuous() {
                        return Some(at);
                    }
                }
                if sets[at].contains(&qubit) {
                    return None;
                }
            }
        }

        let mut sets: Vec<FxHashSet<u32>> = self.layers.iter().map(Layer::touched).collect();
        let mut new_layers: Vec<Layer> = self.layers.clone();
        let mut cur_layer_index = 0;
        while cur_layer_index < new_layers.len() {
            match new_layers[cur_layer_index].kind() {
                LayerKind::Rotation => {
                    let rotations: Vec<(u32, NamedRotation)> = {
                        let Layer::Rotation(rotation) = &new_layers[cur_layer_index] else {
                            unreachable!()
                        };
                        rotation.named_rotations.iter().map(|(&q, &r)| (q, r)).collect()
                    };
                    let mut rewrites: FxHashMap<u32, usize> = FxHashMap::default();
                    let mut all_movable = true;
                    for &(qubit, named) in &rotations {
                        if named.is_identity() {
                            continue;
                        }
                        let home = scan(&new_layers, &sets, qubit, cur_layer_index, -1)
                            .or_else(|| scan(&new_layers, &sets, qubit, cur_layer_index, 1));
                        match home {
                            Some(index) => {
                                rewrites.insert(qubit, index);
                            }
                            None => {
                                all_movable = false;
                                break;
                            }
                        }
                    }
                    if all_movable {
                        for &(qubit, named) in &rotations {
                            if named.is_identity() {
                                continue;
                            }
                            let home = rewrites[&qubit];
                            let Layer::Rotation(target) = &mut new_layers[home] else {
                                unreachable!("scan only returns rotation layers")
                            };
                            if home > cur_layer_index {
                                target.prepend_named_rotation(named, qubit);
                            } else {
                                target.append_named_rotation(named, qubit);
                            }
                            let still_rotates = target
                                .named_rotations
                                .get(&qubit)
                                .is_some_and(|r| !r.is_identity());
                            if still_rotates {
                                sets[home].insert(qubit);
                            } else {
                                sets[home].remove(&qubit);
                            }
                        }
                        let Layer::Rotation(cleared) = &mut new_layers[cur_layer_index] else {
                            unreachable!()
                        };
                        cleared.named_rotations.clear();
                        sets[cur_layer_index].clear();
                    }
                }
                LayerKind::Loop => {
                    let Layer::Loop(loop_layer) = &mut new_layers[cur_layer_index] else {
                        unreachable!()
                    };
                    loop_layer.body = loop_layer.body.with_clearable_rotation_layers_cleared();
                }
                _ => {}
            }
            cur_layer_index += 1;
        }
        LayerCircuit::from_layers(new_layers.into_iter().filter(|l| !l.is_vacuous()).collect())
    }

    /// Rewrite loops so that they only have rotations at the start, not the
    /// end.
    ///
    /// A loop whose body ends with a rotation layer R (modulo trailing
    /// annotations) becomes `R⁻¹ ; loop(R ; rest) ; R`, which later merging
    /// passes can reduce further.
    #[must_use]
    pub fn with_rotations_rolled_from_end_of_loop_to_start_of_loop(&self) -> LayerCircuit {
        let mut new_layers: Vec<Layer> = Vec::new();
        for layer in &self.layers {
            let mut handled = false;
            if let Layer::Loop(loop_layer) = layer {
                let mut loop_layers = loop_layer.body.layers.clone();
                let mut rot_layer_index = loop_layers.len().saturating_sub(1);
                while rot_layer_index > 0 {
                    match &loop_layers[rot_layer_index] {
                        Layer::DetObs(_) | Layer::ShiftCoords(_) => {
                            rot_layer_index -= 1;
                        }
                        Layer::Rotation(_) => break,
                        // Loop didn't end with a rotation layer; give up.
                        _ => rot_layer_index = 0,
                    }
                }
                if rot_layer_index > 0 {
                    handled = true;
                    let Layer::Rotation(popped) = loop_layers.remove(rot_layer_index) else {
                        unreachable!()
                    };
                    loop_layers.insert(0, Layer::Rotation(popped.clone()));

                    new_layers.push(Layer::Rotation(popped.inverse()));
                    new_layers.push(Layer::Loop(LoopLayer {
                        body: LayerCircuit::from_layers(loop_layers),
                        repetitions: loop_layer.repetitions,
                    }));
                    new_layers.push(Layer::Rotation(popped));
                }
            }
            if !handled {
                new_layers.push(layer.clone());
            }
        }
        LayerCircuit::from_layers(new_layers.into_iter().filter(|l| !l.is_vacuous()).collect())
    }

    /// Move each rotation as far left as possible, merging it into the
    /// nearest earlier rotation layer on its qubit's path.
    #[must_use]
    pub fn with_rotations_merged_earlier(&self) -> LayerCircuit {
        fn scan(
            new_layers: &[Layer],
            sets: &[FxHashSet<u32>],
            qubit: u32,
            start_layer: usize,
        ) -> Option<usize> {
            let mut index = start_layer;
            loop {
                if index == 0 {
                    return None;
                }
                index -= 1;
                if let Layer::Rotation(rotation) = &new_layers[index] {
                    if rotation.named_rotations.contains_key(&qubit) {
                        return Some(index);
                    }
                }
                if sets[index].contains(&qubit) {
                    return None;
                }
            }
        }

        let mut sets: Vec<FxHashSet<u32>> = self.layers.iter().map(Layer::touched).collect();
        let mut new_layers: Vec<Layer> = self.layers.clone();
        let mut cur_layer_index = 0;
        while cur_layer_index < new_layers.len() {
            match new_layers[cur_layer_index].kind() {
                LayerKind::Rotation => {
                    let rotations: Vec<(u32, NamedRotation)> = {
                        let Layer::Rotation(rotation) = &new_layers[cur_layer_index] else {
                            unreachable!()
                        };
                        rotation.named_rotations.iter().map(|(&q, &r)| (q, r)).collect()
                    };
                    let mut rewrites: Vec<(u32, usize)> = Vec::new();
                    for &(qubit, named) in &rotations {
                        if named.is_identity() {
                            continue;
                        }
                        if let Some(dst) = scan(&new_layers, &sets, qubit, cur_layer_index) {
                            rewrites.push((qubit, dst));
                        }
                    }
                    for (qubit, dst) in rewrites {
                        let popped = {
                            let Layer::Rotation(cur) = &mut new_layers[cur_layer_index] else {
                                unreachable!()
                            };
                            match cur.named_rotations.remove(&qubit) {
                                Some(named) => named,
                                None => unreachable!("rewrite targets an existing rotation"),
                            }
                        };
                        let Layer::Rotation(target) = &mut new_layers[dst] else {
                            unreachable!("scan only returns rotation layers")
                        };
                        target.append_named_rotation(popped, qubit);
                        sets[cur_layer_index].remove(&qubit);
                        if target.named_rotations.contains_key(&qubit) {
                            sets[dst].insert(qubit);
                        } else {
                            sets[dst].remove(&qubit);
                        }
                    }
                }
                LayerKind::Loop => {
                    let Layer::Loop(loop_layer) = &mut new_layers[cur_layer_index] else {
                        unreachable!()
                    };
                    loop_layer.body = loop_layer.body.with_rotations_merged_earlier();
                }
                _ => {}
            }
            cur_layer_index += 1;
        }
        LayerCircuit::from_layers(new_layers.into_iter().filter(|l| !l.is_vacuous()).collect())
    }

    /// Slide whole rotation layers earlier past layers touching none of
    /// their qubits, absorbing rotation layers they land on.
    #[must_use]
    pub fn with_whole_rotation_layers_slid_earlier(&self) -> LayerCircuit {
        let mut rev_layers: Vec<Layer> = Vec::new();
        let mut cur_rot: Option<crate::layers::RotationLayer> = None;
        let mut cur_touched: FxHashSet<u32> = FxHashSet::default();
        for layer in self.layers.iter().rev() {
            if cur_rot.is_some() && !layer.touched().is_disjoint(&cur_touched) {
                if let Some(rotation) = cur_rot.take() {
                    rev_layers.push(Layer::Rotation(rotation));
                }
                cur_touched = FxHashSet::default();
            }
            if let Layer::Rotation(rotation) = layer {
                let mut merged = rotation.clone();
                if let Some(later) = cur_rot.take() {
                    for (&qubit, &named) in &later.named_rotations {
                        merged.append_named_rotation(named, qubit);
                    }
                }
                cur_touched = merged.touched();
                cur_rot = Some(merged);
            } else {
                rev_layers.push(layer.clone());
            }
        }
        if let Some(rotation) = cur_rot {
            rev_layers.push(Layer::Rotation(rotation));
        }
        rev_layers.reverse();
        LayerCircuit::from_layers(rev_layers)
    }

    /// Slide whole measurement layers earlier past layers touching none of
    /// their qubits, fusing them with measurement layers they land on and
    /// renumbering record references they slide past.
    #[must_use]
    pub fn with_whole_measurement_layers_slid_earlier(&self) -> LayerCircuit {
        let mut rev_layers: Vec<Layer> = Vec::new();
        let mut cur_meas: Option<MeasureLayer> = None;
        let mut cur_touched: FxHashSet<u32> = FxHashSet::default();
        for layer in self.layers.iter().rev() {
            if cur_meas.is_some() && !layer.touched().is_disjoint(&cur_touched) {
                if let Some(measure) = cur_meas.take() {
                    rev_layers.push(Layer::Measure(measure));
                }
                cur_touched = FxHashSet::default();
            }

            let mut layer = layer.clone();
            if let Some(measure) = &cur_meas {
                if matches!(layer, Layer::Feedback(_) | Layer::DetObs(_)) {
                    layer = layer.with_rec_targets_shifted_by(-(measure.targets.len() as i32));
                }
            }

            if let Layer::Measure(measure) = &layer {
                let mut merged = measure.clone();
                if let Some(later) = cur_meas.take() {
                    merged.targets.extend_from_slice(&later.targets);
                    merged.bases.extend_from_slice(&later.bases);
                }
                cur_touched = merged.touched();
                cur_meas = Some(merged);
            } else {
                rev_layers.push(layer);
            }
        }
        if let Some(measure) = cur_meas {
            rev_layers.push(Layer::Measure(measure));
        }
        rev_layers.reverse();
        LayerCircuit::from_layers(rev_layers)
    }

    /// Fuse two measurement layers separated only by annotations, shifting
    /// the record references of the annotations in between.
    #[must_use]
    pub fn with_locally_merged_measure_layers(&self) -> LayerCircuit {
        let mut new_layers: Vec<Layer> = Vec::new();
        let mut k = 0;
        while k < self.layers.len() {
            if let Layer::Measure(m1) = &self.layers[k] {
                let mut k2 = k + 1;
                while k2 < self.layers.len()
                    && matches!(
                        self.layers[k2],
                        Layer::DetObs(_) | Layer::ShiftCoords(_)
                    )
                {
                    k2 += 1;
                }
                if k2 < self.layers.len() {
                    if let Layer::Measure(m2) = &self.layers[k2] {
                        let targets1: FxHashSet<u32> = m1.targets.iter().copied().collect();
                        if m2.targets.iter().all(|q| !targets1.contains(q)) {
                            let mut merged = m1.clone();
                            merged.targets.extend_from_slice(&m2.targets);
                            merged.bases.extend_from_slice(&m2.bases);
                            new_layers.push(Layer::Measure(merged));
                            for k3 in (k + 1)..k2 {
                                new_layers.push(
                                    self.layers[k3]
                                        .with_rec_targets_shifted_by(-(m2.targets.len() as i32)),
                                );
                            }
                            k = k2 + 1;
                            continue;
                        }
                    }
                }
            }
            new_layers.push(self.layers[k].clone());
            k += 1;
        }
        LayerCircuit::from_layers(new_layers)
    }

    /// Slide each layer of one of the given kinds left while its qubits stay
    /// untouched, merging it with the first same-kind layer it reaches.
    #[must_use]
    pub fn with_whole_layers_slid_as_to_merge_with_previous_layer_of_same_type(
        &self,
        layer_kinds: &[LayerKind],
    ) -> LayerCircuit {
        let mut new_layers: Vec<Layer> = self.layers.clone();
        let mut k = 0;
        while k < new_layers.len() {
            if layer_kinds.contains(&new_layers[k].kind()) {
                let touched = new_layers[k].touched();
                let mut k_prev = k;
                while k_prev > 0 && new_layers[k_prev - 1].touched().is_disjoint(&touched) {
                    k_prev -= 1;
                    if k_prev != k && new_layers[k_prev].kind() == new_layers[k].kind() {
                        let moved = new_layers.remove(k);
                        let merged = new_layers[k_prev].locally_optimized(Some(&moved));
                        new_layers[k_prev] = single_fused(merged);
                        break;
                    }
                }
            }
            k += 1;
        }
        LayerCircuit::from_layers(new_layers)
    }

    /// Slide each layer of one of the given kinds as far left as possible,
    /// then merge it with the same-kind layer found there, if any.
    #[must_use]
    pub fn with_whole_layers_slid_as_early_as_possible_for_merge_with_same_layer(
        &self,
        layer_kinds: &[LayerKind],
    ) -> LayerCircuit {
        let mut new_layers: Vec<Layer> = self.layers.clone();
        let mut k = 0;
        while k < new_layers.len() {
            if layer_kinds.contains(&new_layers[k].kind()) {
                let touched = new_layers[k].touched();
                let mut k_prev = k;
                while k_prev > 0 && new_layers[k_prev - 1].touched().is_disjoint(&touched) {
                    k_prev -= 1;
                }
                while k_prev < k && new_layers[k_prev].kind() != new_layers[k].kind() {
                    k_prev += 1;
                }
                if k_prev != k {
                    let moved = new_layers.remove(k);
                    let merged = new_layers[k_prev].locally_optimized(Some(&moved));
                    new_layers[k_prev] = single_fused(merged);
                    continue;
                }
            }
            k += 1;
        }
        LayerCircuit::from_layers(new_layers)
    }

    /// Peel one iteration off each end of every loop with at least three
    /// repetitions; shorter loops are inlined entirely.
    #[must_use]
    pub fn with_ejected_loop_iterations(&self) -> LayerCircuit {
        let mut new_layers: Vec<Layer> = Vec::new();
        for layer in &self.layers {
            match layer {
                Layer::Loop(loop_layer) => match loop_layer.repetitions {
                    0 => {}
                    1 => new_layers.extend(loop_layer.body.layers.iter().cloned()),
                    2 => {
                        new_layers.extend(loop_layer.body.layers.iter().cloned());
                        new_layers.extend(loop_layer.body.layers.iter().cloned());
                    }
                    repetitions => {
                        new_layers.extend(loop_layer.body.layers.iter().cloned());
                        new_layers.push(Layer::Loop(LoopLayer {
                            body: loop_layer.body.clone(),
                            repetitions: repetitions - 2,
                        }));
                        new_layers.extend(loop_layer.body.layers.iter().cloned());
                    }
                },
                other => new_layers.push(other.clone()),
            }
        }
        LayerCircuit::from_layers(new_layers)
    }

    /// Drop every Empty layer, recursing into loops.
    #[must_use]
    pub fn without_empty_layers(&self) -> LayerCircuit {
        let mut new_layers: Vec<Layer> = Vec::new();
        for layer in &self.layers {
            match layer {
                Layer::Empty => {}
                Layer::Loop(loop_layer) => new_layers.push(Layer::Loop(LoopLayer {
                    body: loop_layer.body.without_empty_layers(),
                    repetitions: loop_layer.repetitions,
                })),
                other => new_layers.push(other.clone()),
            }
        }
        LayerCircuit::from_layers(new_layers)
    }

    /// Absorb copies of a loop's body sitting right before or after the loop
    /// into the loop itself, incrementing its repetition count.
    #[must_use]
    pub fn with_cleaned_up_loop_iterations(&self) -> LayerCircuit {
        let mut new_layers: Vec<Layer> = self.without_empty_layers().layers;
        let mut k = 0;
        while k < new_layers.len() {
            if matches!(new_layers[k], Layer::Loop(_)) {
                let (body_layers, mut repetitions) = {
                    let Layer::Loop(loop_layer) = &new_layers[k] else {
                        unreachable!()
                    };
                    (loop_layer.body.layers.clone(), loop_layer.repetitions)
                };
                if !body_layers.is_empty() {
                    while k >= body_layers.len()
                        && new_layers[k - body_layers.len()..k] == body_layers[..]
                    {
                        new_layers.drain(k - body_layers.len()..k);
                        k -= body_layers.len();
                        repetitions += 1;
                    }
                    while k + body_layers.len() < new_layers.len()
                        && new_layers[k + 1..k + 1 + body_layers.len()] == body_layers[..]
                    {
                        new_layers.drain(k + 1..k + 1 + body_layers.len());
                        repetitions += 1;
                    }
                    new_layers[k] = Layer::Loop(LoopLayer {
                        body: LayerCircuit::from_layers(body_layers),
                        repetitions,
                    });
                }
            }
            k += 1;
        }
        LayerCircuit::from_layers(new_layers)
    }

    /// Drop trailing layers whose effect cannot influence any measurement
    /// or detector.
    #[must_use]
    pub fn with_irrelevant_tail_layers_removed(&self) -> LayerCircuit {
        const IRRELEVANT_AT_END: [LayerKind; 8] = [
            LayerKind::Reset,
            LayerKind::Interact,
            LayerKind::Feedback,
            LayerKind::Rotation,
            LayerKind::Swap,
            LayerKind::ISwap,
            LayerKind::InteractSwap,
            LayerKind::Empty,
        ];
        let mut result: Vec<Layer> = self.layers.clone();
        while result
            .last()
            .is_some_and(|layer| IRRELEVANT_AT_END.contains(&layer.kind()))
        {
            result.pop();
        }
        LayerCircuit::from_layers(result)
    }
}
