use std::rc::Rc;

use usex_core::MaybeSignal;

use crate::{Modal, ModalData, ModalOptions};

type OpenEffect<H, T, O> = Rc<dyn Fn(&H, &T, &O)>;
type CloseEffect<H, R, C> = Rc<dyn Fn(&H, Option<&R>, &C)>;

/// Builds [`Modal`]s bound to a native dialog handle `H`.
///
/// The open effect runs when the modal opens, before the user's `on_open`;
/// the close effect runs when it closes, before the user's `on_close`. The
/// handle is resolved at each transition, so it may be a signal that is only
/// filled in once the dialog is mounted.
pub struct RefModalFactory<H, O, C, T, R> {
    open: OpenEffect<H, T, O>,
    close: CloseEffect<H, R, C>,
}

impl<H, O, C, T, R> Clone for RefModalFactory<H, O, C, T, R> {
    fn clone(&self) -> Self {
        Self {
            open: self.open.clone(),
            close: self.close.clone(),
        }
    }
}

pub fn create_ref_modal<H, O, C, T, R>(
    open: impl Fn(&H, &T, &O) + 'static,
    close: impl Fn(&H, Option<&R>, &C) + 'static,
) -> RefModalFactory<H, O, C, T, R> {
    RefModalFactory {
        open: Rc::new(open),
        close: Rc::new(close),
    }
}

impl<H, O, C, T, R> RefModalFactory<H, O, C, T, R>
where
    H: Clone + 'static,
    O: 'static,
    C: 'static,
    T: ModalData,
    R: Clone + 'static,
{
    pub fn create(
        &self,
        handle: impl Into<MaybeSignal<H>>,
        options: ModalOptions<T, R>,
        open_options: O,
        close_options: C,
    ) -> Modal<T, R> {
        let handle = handle.into();
        let ModalOptions {
            init_data,
            reset_data_after_close,
            on_open,
            on_close,
        } = options;

        let open_effect = self.open.clone();
        let open_handle = handle.clone();
        let close_effect = self.close.clone();

        Modal::new(
            ModalOptions::new(init_data)
                .reset_data_after_close(reset_data_after_close)
                .on_open(move |data| {
                    open_effect(&open_handle.get(), data, &open_options);
                    if let Some(on_open) = &on_open {
                        on_open(data);
                    }
                })
                .on_close(move |return_value| {
                    close_effect(&handle.get(), return_value, &close_options);
                    if let Some(on_close) = &on_close {
                        on_close(return_value);
                    }
                }),
        )
    }
}
