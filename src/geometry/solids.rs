use std::sync::Arc;

use crate::crs::Crs;

use super::{first_dimension, GeometryId, Member, Surface};

/// `gml:Solid`: bounded by an optional exterior shell and interior shells.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidBody {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub exterior: Option<Member<Surface>>,
    pub interiors: Vec<Member<Surface>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSolid {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub members: Vec<Member<Solid>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Solid {
    Solid(Arc<SolidBody>),
    Composite(Arc<CompositeSolid>),
}

impl Solid {
    pub fn id(&self) -> Option<&GeometryId> {
        match self {
            Solid::Solid(s) => s.id.as_ref(),
            Solid::Composite(s) => s.id.as_ref(),
        }
    }

    pub fn crs(&self) -> Option<&Crs> {
        match self {
            Solid::Solid(s) => s.crs.as_ref(),
            Solid::Composite(s) => s.crs.as_ref(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Solid::Solid(_) => "Solid",
            Solid::Composite(_) => "CompositeSolid",
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Solid::Solid(s) => match &s.exterior {
                Some(exterior) => first_dimension(std::slice::from_ref(exterior), Surface::dimension),
                None => 3,
            },
            Solid::Composite(s) => first_dimension(&s.members, Solid::dimension),
        }
    }
}
