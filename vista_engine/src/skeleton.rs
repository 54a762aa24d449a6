/// Bone hierarchy for skinned meshes.
///
/// Bones live in a flat arena and link to their first child and next
/// sibling by index. Bone 0 is the root; further roots hang off it as
/// siblings. Transforms are composed parent-first (`parent * local`) and
/// every walk uses an explicit stack.

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::config::MAX_BONES;
use crate::error::{Error, Result};
use crate::vertex::SkeletonVertex;

/// One joint of a skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Local bind transform relative to the parent
    pub transform: Mat4,
    /// Inverse of the bone's bind-pose world transform
    pub inverse_bind: Mat4,
    pub parent: Option<u32>,
    pub child: Option<u32>,
    pub next: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self { bones: Vec::new() }
    }

    /// Append a bone as the last child of `parent` (or as a root sibling
    /// when `parent` is `None`).
    pub fn push_bone(
        &mut self,
        name: impl Into<String>,
        transform: Mat4,
        inverse_bind: Mat4,
        parent: Option<u32>,
    ) -> Result<u32> {
        if self.bones.len() >= MAX_BONES {
            return Err(Error::OutOfMemory);
        }
        if let Some(p) = parent {
            if p as usize >= self.bones.len() {
                return Err(Error::InvalidResource(format!("Parent bone {} does not exist", p)));
            }
        }
        let id = self.bones.len() as u32;
        self.bones.push(Bone {
            name: name.into(),
            transform,
            inverse_bind,
            parent,
            child: None,
            next: None,
        });

        // Link into the parent's child list, or the root sibling list
        let first = match parent {
            Some(p) => self.bones[p as usize].child,
            None if id == 0 => return Ok(id),
            None => Some(0),
        };
        match first {
            None => {
                if let Some(p) = parent {
                    self.bones[p as usize].child = Some(id);
                }
            }
            Some(mut last) => {
                while let Some(next) = self.bones[last as usize].next {
                    last = next;
                }
                self.bones[last as usize].next = Some(id);
            }
        }
        Ok(id)
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bone(&self, id: u32) -> Option<&Bone> {
        self.bones.get(id as usize)
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn find_bone(&self, name: &str) -> Option<u32> {
        self.bones.iter().position(|b| b.name == name).map(|i| i as u32)
    }

    /// World transforms of the bind pose. Returns the number of bones written.
    pub fn build_bind_transforms(&self, out: &mut [Mat4]) -> usize {
        self.propagate(|_, bone| bone.transform, out)
    }

    /// World transforms from per-bone local `pose` matrices; bones missing
    /// from `pose` keep their bind transform.
    pub fn build_animation_transforms(&self, pose: &[Mat4], out: &mut [Mat4]) -> usize {
        self.propagate(|i, bone| pose.get(i).copied().unwrap_or(bone.transform), out)
    }

    /// Skinning matrices: world transform times inverse bind.
    pub fn build_render_matrices(&self, transforms: &[Mat4], out: &mut [Mat4]) -> usize {
        let count = self.bones.len().min(transforms.len()).min(out.len());
        for (i, bone) in self.bones[..count].iter().enumerate() {
            out[i] = transforms[i] * bone.inverse_bind;
        }
        count
    }

    /// Apply `transform` on top of bone `id` and its whole subtree.
    /// Siblings of `id` are left alone.
    pub fn apply_transform_to_bone(&self, id: u32, transform: &Mat4, transforms: &mut [Mat4]) {
        let Some(bone) = self.bones.get(id as usize) else {
            return;
        };
        if let Some(t) = transforms.get_mut(id as usize) {
            *t = *transform * *t;
        }
        let mut stack: Vec<u32> = bone.child.into_iter().collect();
        while let Some(i) = stack.pop() {
            let node = &self.bones[i as usize];
            if let Some(t) = transforms.get_mut(i as usize) {
                *t = *transform * *t;
            }
            stack.extend(node.child);
            stack.extend(node.next);
        }
    }

    /// Rotate bone `id` and its subtree around the bone's current position.
    pub fn apply_rotation_to_bone(&self, id: u32, rotation: Quat, transforms: &mut [Mat4]) {
        let Some(current) = transforms.get(id as usize) else {
            return;
        };
        let pivot = current.w_axis.truncate();
        let transform = Mat4::from_translation(pivot) * Mat4::from_quat(rotation) * Mat4::from_translation(-pivot);
        self.apply_transform_to_bone(id, &transform, transforms);
    }

    /// World-space bounds of `vertices` blended by `render_matrices` and
    /// placed by `transform`. `None` for an empty vertex list.
    pub fn skinned_bounds(
        &self,
        vertices: &[SkeletonVertex],
        render_matrices: &[Mat4],
        transform: &Mat4,
    ) -> Option<(Vec3, Vec3)> {
        let mut bounds: Option<(Vec3, Vec3)> = None;
        for v in vertices {
            let local = if self.bones.is_empty() {
                v.position
            } else {
                blend_matrix(v.bone_weights, v.bone_indices.to_array(), render_matrices) * v.position
            };
            let p = transform.transform_point3(local.truncate());
            bounds = Some(match bounds {
                None => (p, p),
                Some((lo, hi)) => (lo.min(p), hi.max(p)),
            });
        }
        bounds
    }

    fn propagate(&self, local: impl Fn(usize, &Bone) -> Mat4, out: &mut [Mat4]) -> usize {
        if self.bones.is_empty() {
            return 0;
        }
        let mut stack = vec![(0u32, Mat4::IDENTITY)];
        while let Some((i, parent)) = stack.pop() {
            let bone = &self.bones[i as usize];
            let world = parent * local(i as usize, bone);
            if let Some(slot) = out.get_mut(i as usize) {
                *slot = world;
            }
            if let Some(next) = bone.next {
                stack.push((next, parent));
            }
            if let Some(child) = bone.child {
                stack.push((child, world));
            }
        }
        self.bones.len().min(out.len())
    }
}

/// Weighted sum of up to four bone matrices; out-of-range indices count as identity
fn blend_matrix(weights: Vec4, indices: [i32; 4], matrices: &[Mat4]) -> Mat4 {
    let mut blended = Mat4::ZERO;
    for (weight, index) in weights.to_array().into_iter().zip(indices) {
        if weight == 0.0 {
            continue;
        }
        let m = usize::try_from(index).ok().and_then(|i| matrices.get(i)).copied().unwrap_or(Mat4::IDENTITY);
        blended += m * weight;
    }
    blended
}

#[cfg(test)]
#[path = "skeleton_tests.rs"]
mod tests;
