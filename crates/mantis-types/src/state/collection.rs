use super::Reducer;

/// An entity held in a normalized collection store with a member list
pub trait Entity: Clone {
    type Member: Clone;
    type Role: Copy;
    type Patch;

    fn id(&self) -> &str;
    fn members_mut(&mut self) -> &mut Vec<Self::Member>;
    fn member_user_id(member: &Self::Member) -> &str;
    fn set_member_role(member: &mut Self::Member, role: Self::Role);
    fn apply_patch(&mut self, patch: &Self::Patch);
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState<T> {
    pub items: Vec<T>,
    pub current: Option<T>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: None,
            is_loading: false,
            error: None,
        }
    }
}

impl<T: Entity> CollectionState<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Applies `f` to the listed item and to `current` when either matches `id`
    fn modify(&mut self, id: &str, f: impl Fn(&mut T)) {
        self.items.iter_mut().filter(|item| item.id() == id).for_each(&f);
        if let Some(current) = self.current.as_mut().filter(|current| current.id() == id) {
            f(current);
        }
    }
}

#[derive(Debug, Clone)]
pub enum CollectionAction<T: Entity> {
    SetLoading(bool),
    SetError(String),
    ClearError,
    SetItems(Vec<T>),
    SetCurrent(Option<T>),
    Add(T),
    Update { id: String, patch: T::Patch },
    Remove(String),
    AddMember { id: String, member: T::Member },
    RemoveMember { id: String, user_id: String },
    UpdateMemberRole { id: String, user_id: String, role: T::Role },
}

impl<T: Entity> Reducer for CollectionState<T> {
    type Action = CollectionAction<T>;

    fn reduce(mut self, action: Self::Action) -> Self {
        match action {
            CollectionAction::SetLoading(loading) => self.is_loading = loading,
            CollectionAction::SetError(error) => {
                self.error = Some(error);
                self.is_loading = false;
            }
            CollectionAction::ClearError => self.error = None,
            CollectionAction::SetItems(items) => {
                self.items = items;
                self.is_loading = false;
            }
            CollectionAction::SetCurrent(current) => self.current = current,
            CollectionAction::Add(item) => self.items.push(item),
            CollectionAction::Update { id, patch } => self.modify(&id, |item| item.apply_patch(&patch)),
            CollectionAction::Remove(id) => {
                self.items.retain(|item| item.id() != id);
                if self.current.as_ref().is_some_and(|current| current.id() == id) {
                    self.current = None;
                }
            }
            CollectionAction::AddMember { id, member } => {
                self.modify(&id, |item| item.members_mut().push(member.clone()))
            }
            CollectionAction::RemoveMember { id, user_id } => self.modify(&id, |item| {
                item.members_mut().retain(|m| T::member_user_id(m) != user_id)
            }),
            CollectionAction::UpdateMemberRole { id, user_id, role } => self.modify(&id, |item| {
                item.members_mut()
                    .iter_mut()
                    .filter(|m| T::member_user_id(m) == user_id)
                    .for_each(|m| T::set_member_role(m, role))
            }),
        }
        self
    }
}
